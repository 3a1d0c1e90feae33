//! EMJ Protocol
//!
//! Framed binary protocol for emoji queries.
//! Every frame starts with a fixed 18-byte header.

mod codec;
mod command;
mod frame;
mod response;

pub use codec::EmjCodec;
pub use command::Command;
pub use frame::{Frame, FrameHeader, OpCode, HEADER_SIZE, MAGIC, MAX_PAYLOAD};
pub use response::Response;
