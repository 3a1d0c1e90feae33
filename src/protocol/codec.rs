//! EMJ Codec for Tokio
//!
//! Implements Encoder and Decoder traits for framed I/O.

use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use super::frame::{Frame, FrameHeader, HEADER_SIZE};

/// Tokio codec for EMJ frames
#[derive(Debug, Default)]
pub struct EmjCodec {
    /// Current decode state
    state: DecodeState,
}

#[derive(Debug, Default)]
enum DecodeState {
    #[default]
    Header,
    Payload(FrameHeader),
}

impl EmjCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for EmjCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match &self.state {
                DecodeState::Header => {
                    if src.len() < HEADER_SIZE {
                        return Ok(None);
                    }

                    let header = FrameHeader::decode(&mut src.split_to(HEADER_SIZE).freeze())?;
                    self.state = DecodeState::Payload(header);
                }

                DecodeState::Payload(header) => {
                    let payload_len = header.payload_len as usize;

                    if src.len() < payload_len {
                        return Ok(None);
                    }

                    let payload = src.split_to(payload_len).freeze();
                    let frame = Frame {
                        header: header.clone(),
                        payload,
                    };

                    self.state = DecodeState::Header;
                    return Ok(Some(frame));
                }
            }
        }
    }
}

impl Encoder<Frame> for EmjCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(HEADER_SIZE + item.payload.len());
        item.encode(dst);
        Ok(())
    }
}
