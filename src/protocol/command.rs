//! EMJ Command Parsing
//!
//! Parses request arguments from EMJ frames.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;

use super::frame::{Frame, OpCode};
use crate::emoji::LabelFormat;

/// Parsed request from an EMJ frame
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Health check
    Ping,

    /// Emoji for a word; `count` 0 asks for the server default
    Query {
        word: String,
        count: u32,
        format: LabelFormat,
    },
}

impl Command {
    /// Parse command from an EMJ frame
    pub fn from_frame(frame: &Frame) -> io::Result<Self> {
        match frame.header.opcode {
            OpCode::Ping => Ok(Command::Ping),

            OpCode::Query => {
                let mut payload = frame.payload.clone();
                let word = read_string(&mut payload)?;
                if payload.remaining() < 5 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "Not enough data for query options",
                    ));
                }
                let count = payload.get_u32();
                let format = match payload.get_u8() {
                    0 => LabelFormat::Name,
                    1 => LabelFormat::Char,
                    other => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("Invalid label format: {}", other),
                        ))
                    }
                };
                Ok(Command::Query {
                    word,
                    count,
                    format,
                })
            }

            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unexpected opcode for command: {:?}", frame.header.opcode),
            )),
        }
    }

    /// Encode command to frame payload bytes
    pub fn encode(&self) -> (OpCode, Bytes) {
        match self {
            Command::Ping => (OpCode::Ping, Bytes::new()),

            Command::Query {
                word,
                count,
                format,
            } => {
                let mut buf = BytesMut::with_capacity(4 + word.len() + 5);
                write_string(&mut buf, word);
                buf.put_u32(*count);
                buf.put_u8(match format {
                    LabelFormat::Name => 0,
                    LabelFormat::Char => 1,
                });
                (OpCode::Query, buf.freeze())
            }
        }
    }

    /// Command name used for metrics and logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Query { .. } => "QUERY",
        }
    }
}

pub(crate) fn read_string(buf: &mut Bytes) -> io::Result<String> {
    if buf.remaining() < 4 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Not enough data for length prefix",
        ));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Not enough data for payload",
        ));
    }
    String::from_utf8(buf.copy_to_bytes(len).to_vec())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "String is not valid UTF-8"))
}

pub(crate) fn write_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_command() {
        let frame = Frame::ping(1);
        let cmd = Command::from_frame(&frame).unwrap();
        assert!(matches!(cmd, Command::Ping));
    }

    #[test]
    fn test_query_command() {
        let cmd = Command::Query {
            word: "café".to_string(),
            count: 3,
            format: LabelFormat::Char,
        };
        let (opcode, payload) = cmd.encode();
        let frame = Frame::new(opcode, 1, payload);
        assert_eq!(Command::from_frame(&frame).unwrap(), cmd);
    }

    #[test]
    fn test_truncated_query() {
        let (opcode, payload) = Command::Query {
            word: "cat".to_string(),
            count: 3,
            format: LabelFormat::Name,
        }
        .encode();
        let frame = Frame::new(opcode, 1, payload.slice(..payload.len() - 1));
        assert!(Command::from_frame(&frame).is_err());
    }

    #[test]
    fn test_invalid_utf8() {
        let mut buf = BytesMut::new();
        buf.put_u32(2);
        buf.put_slice(&[0xC3, 0x28]);
        buf.put_u32(1);
        buf.put_u8(0);
        let frame = Frame::new(OpCode::Query, 1, buf.freeze());
        let err = Command::from_frame(&frame).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_response_opcode_is_not_a_command() {
        let frame = Frame::empty(OpCode::Pong, 1);
        assert!(Command::from_frame(&frame).is_err());
    }
}
