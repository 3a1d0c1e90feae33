//! Connection Handler
//!
//! Processes EMJ frames and dispatches commands.

use crate::protocol::{Command, EmjCodec, Response};
use futures::{SinkExt, StreamExt};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::debug;

use super::service::QueryService;

/// Connection handler
pub struct Handler {
    service: QueryService,
}

impl Handler {
    pub fn new(service: QueryService) -> Self {
        Self { service }
    }

    /// Run the handler for a connection
    pub async fn run<T>(self, mut framed: Framed<T, EmjCodec>) -> std::io::Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        while let Some(result) = framed.next().await {
            let frame = result?;
            let start = Instant::now();

            let request_id = frame.header.request_id;
            let (cmd_name, response) = match Command::from_frame(&frame) {
                Ok(cmd) => (cmd.name(), self.execute(cmd)),
                Err(e) => (frame.header.opcode.name(), Response::Error(e.to_string())),
            };

            framed.send(response.to_frame(request_id)).await?;

            let elapsed = start.elapsed();
            self.service.metrics().record_operation(cmd_name, elapsed);
            debug!(cmd = %cmd_name, latency = ?elapsed, "Command executed");
        }

        Ok(())
    }

    /// Execute a command and return response
    fn execute(&self, cmd: Command) -> Response {
        match cmd {
            Command::Ping => Response::Pong,

            Command::Query {
                word,
                count,
                format,
            } => {
                let count = (count > 0).then_some(count as usize);
                match self.service.answer(&word, count, format) {
                    Some(matches) => Response::Matches(matches),
                    None => Response::Nil,
                }
            }
        }
    }
}
