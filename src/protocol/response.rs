//! EMJ Response types
//!
//! Response variants for command execution results.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;

use super::command::{read_string, write_string};
use super::frame::{Frame, OpCode};

/// Response to a command
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Pong response (for PING)
    Pong,

    /// Labelled emoji with scores, best first
    Matches(Vec<(String, f32)>),

    /// Word not in the vocabulary
    Nil,

    /// Error response
    Error(String),
}

impl Response {
    /// Convert response to an EMJ frame
    pub fn to_frame(&self, request_id: u64) -> Frame {
        match self {
            Response::Pong => Frame::empty(OpCode::Pong, request_id),
            Response::Nil => Frame::empty(OpCode::Nil, request_id),
            Response::Error(msg) => Frame::new(
                OpCode::Error,
                request_id,
                Bytes::copy_from_slice(msg.as_bytes()),
            ),
            Response::Matches(items) => {
                let mut buf = BytesMut::new();
                buf.put_u32(items.len() as u32);
                for (label, score) in items {
                    write_string(&mut buf, label);
                    buf.put_f32(*score);
                }
                Frame::new(OpCode::Matches, request_id, buf.freeze())
            }
        }
    }

    /// Parse response from an EMJ frame
    pub fn from_frame(frame: &Frame) -> io::Result<Self> {
        match frame.header.opcode {
            OpCode::Pong => Ok(Response::Pong),
            OpCode::Nil => Ok(Response::Nil),
            OpCode::Error => {
                let msg = String::from_utf8_lossy(&frame.payload).to_string();
                Ok(Response::Error(msg))
            }
            OpCode::Matches => {
                let mut buf = frame.payload.clone();
                if buf.remaining() < 4 {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, "Invalid matches payload"));
                }
                let count = buf.get_u32() as usize;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    let label = read_string(&mut buf)?;
                    if buf.remaining() < 4 {
                        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Insufficient score data"));
                    }
                    items.push((label, buf.get_f32()));
                }
                Ok(Response::Matches(items))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unexpected opcode for response: {:?}", frame.header.opcode),
            )),
        }
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::Pong => write!(f, "PONG"),
            Response::Nil => write!(f, "(nil)"),
            Response::Error(msg) => write!(f, "(error) {}", msg),
            Response::Matches(items) if items.is_empty() => write!(f, "(empty)"),
            Response::Matches(items) => {
                for (i, (label, score)) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {} {:.4}", i + 1, label, score)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_frame() {
        let response = Response::Matches(vec![("😀".to_string(), 0.75), ("cat".to_string(), 0.5)]);
        let frame = response.to_frame(7);
        assert_eq!(frame.header.opcode, OpCode::Matches);
        assert_eq!(frame.header.request_id, 7);
        assert_eq!(Response::from_frame(&frame).unwrap(), response);
    }

    #[test]
    fn test_truncated_matches() {
        let frame = Response::Matches(vec![("cat".to_string(), 0.5)]).to_frame(1);
        let cut = Frame::new(OpCode::Matches, 1, frame.payload.slice(..frame.payload.len() - 2));
        assert!(Response::from_frame(&cut).is_err());
    }

    #[test]
    fn test_display() {
        let response = Response::Matches(vec![("cat".to_string(), 0.5)]);
        assert_eq!(response.to_string(), "1) cat 0.5000");
        assert_eq!(Response::Nil.to_string(), "(nil)");
    }
}
