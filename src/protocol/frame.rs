//! EMJ Frame Structure
//!
//! Binary frame format with an 18-byte header.

use bytes::{BufMut, Buf, Bytes, BytesMut};
use std::io;

/// Magic bytes identifying the EMJ protocol: "EMJX"
pub const MAGIC: [u8; 4] = [0x45, 0x4D, 0x4A, 0x58];

/// Protocol version
pub const VERSION: u8 = 1;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 18;

/// Largest payload accepted from a peer
pub const MAX_PAYLOAD: u32 = 1 << 20;

/// Operation codes for EMJ frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    // Requests
    Ping = 0x01,
    Query = 0x02,

    // Responses
    Pong = 0x10,
    Matches = 0x11,
    Nil = 0x12,
    Error = 0x13,
}

impl OpCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(OpCode::Ping),
            0x02 => Some(OpCode::Query),
            0x10 => Some(OpCode::Pong),
            0x11 => Some(OpCode::Matches),
            0x12 => Some(OpCode::Nil),
            0x13 => Some(OpCode::Error),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Ping => "PING",
            OpCode::Query => "QUERY",
            OpCode::Pong => "PONG",
            OpCode::Matches => "MATCHES",
            OpCode::Nil => "NIL",
            OpCode::Error => "ERROR",
        }
    }
}

/// EMJ Frame Header (18 bytes)
///
/// ```text
/// ┌──────────┬──────────┬──────────┬────────────────────┬─────────────┐
/// │  Magic   │ Version  │  OpCode  │    Request ID      │ Payload Len │
/// │ (4 bytes)│ (1 byte) │ (1 byte) │    (8 bytes)       │  (4 bytes)  │
/// └──────────┴──────────┴──────────┴────────────────────┴─────────────┘
/// ```
///
/// The version byte is checked on decode and always written as [`VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub opcode: OpCode,
    pub request_id: u64,
    pub payload_len: u32,
}

impl FrameHeader {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&MAGIC);
        buf.put_u8(VERSION);
        buf.put_u8(self.opcode as u8);
        buf.put_u64(self.request_id);
        buf.put_u32(self.payload_len);
    }

    /// Decode a header from exactly [`HEADER_SIZE`] bytes
    pub fn decode(buf: &mut impl Buf) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);
        if magic != MAGIC {
            return Err(invalid("Invalid magic bytes".to_string()));
        }

        let version = buf.get_u8();
        if version != VERSION {
            return Err(invalid(format!("Unsupported protocol version: {version}")));
        }

        let opcode_byte = buf.get_u8();
        let opcode = OpCode::from_u8(opcode_byte)
            .ok_or_else(|| invalid(format!("Invalid opcode: {opcode_byte:#04x}")))?;
        let request_id = buf.get_u64();
        let payload_len = buf.get_u32();
        if payload_len > MAX_PAYLOAD {
            return Err(invalid(format!("Payload too large: {payload_len} bytes")));
        }

        Ok(Self {
            opcode,
            request_id,
            payload_len,
        })
    }
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Complete EMJ frame with header and payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(opcode: OpCode, request_id: u64, payload: Bytes) -> Self {
        let header = FrameHeader {
            opcode,
            request_id,
            payload_len: payload.len() as u32,
        };
        Self { header, payload }
    }

    /// Frame with no payload
    pub fn empty(opcode: OpCode, request_id: u64) -> Self {
        Self::new(opcode, request_id, Bytes::new())
    }

    pub fn ping(request_id: u64) -> Self {
        Self::empty(OpCode::Ping, request_id)
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        self.header.encode(buf);
        buf.put_slice(&self.payload);
    }
}
