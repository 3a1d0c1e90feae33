//! Server Module
//!
//! TCP server for EMJ protocol connections, plus the optional HTTP surface.
//! Every connection runs on its own task against the shared, immutable
//! query engine.

mod config;
mod handler;
pub mod http;
mod service;

pub use config::Config;
pub use handler::Handler;
pub use service::QueryService;

use crate::emoji::EmojiDataset;
use crate::metrics::Metrics;
use crate::protocol::EmjCodec;
use crate::query::QueryEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::codec::Framed;
use tracing::{error, info};

/// Emoji query server
pub struct Server {
    config: Config,
    service: QueryService,
}

impl Server {
    pub fn new(config: Config, engine: Arc<QueryEngine>, dataset: Arc<EmojiDataset>) -> Self {
        Self {
            config,
            service: QueryService::new(engine, dataset),
        }
    }

    /// Bind the configured ports and serve until an error occurs
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.addr()).await?;
        let http_listener = match self.config.http_addr() {
            Some(addr) => Some(TcpListener::bind(addr).await?),
            None => None,
        };
        self.serve(listener, http_listener).await
    }

    /// Serve on already-bound listeners
    pub async fn serve(
        self,
        listener: TcpListener,
        http_listener: Option<TcpListener>,
    ) -> std::io::Result<()> {
        info!(
            "emojimatch server listening on {} ({} representatives)",
            listener.local_addr()?,
            self.service.engine().len()
        );

        if let Some(http_listener) = http_listener {
            let service = self.service.clone();
            tokio::spawn(async move {
                if let Err(e) = http::serve(http_listener, service).await {
                    error!("HTTP surface stopped: {}", e);
                }
            });
        }

        if self.config.metrics_interval > 0 {
            Self::spawn_metrics_reporter(
                self.service.metrics().clone(),
                Duration::from_secs(self.config.metrics_interval),
            );
        }

        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    info!("New connection from {}", peer_addr);

                    let service = self.service.clone();
                    tokio::spawn(async move {
                        let framed = Framed::new(socket, EmjCodec::new());
                        let handler = Handler::new(service);

                        if let Err(e) = handler.run(framed).await {
                            error!("Connection error from {}: {}", peer_addr, e);
                        }

                        info!("Connection closed: {}", peer_addr);
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }

    fn spawn_metrics_reporter(metrics: Arc<Metrics>, every: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                info!("{}", metrics.summary());
            }
        });
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        self.service.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emoji::LabelFormat;
    use crate::protocol::{Command, Frame, Response};
    use futures::{SinkExt, StreamExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_server_round_trip() {
        let service = super::service::tests::pets();
        let server = Server {
            config: Config::default().with_metrics_interval(0),
            service: service.clone(),
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.serve(listener, None));

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = Framed::new(stream, EmjCodec::new());

        client.send(Frame::ping(1)).await.unwrap();
        let pong = client.next().await.unwrap().unwrap();
        assert_eq!(Response::from_frame(&pong).unwrap(), Response::Pong);

        let (opcode, payload) = Command::Query {
            word: "puppy".to_string(),
            count: 3,
            format: LabelFormat::Char,
        }
        .encode();
        client.send(Frame::new(opcode, 2, payload)).await.unwrap();
        let reply = client.next().await.unwrap().unwrap();
        // "puppy" is a keyword but not in the vocabulary
        assert_eq!(Response::from_frame(&reply).unwrap(), Response::Nil);
        assert_eq!(service.metrics().unknown_words(), 1);
        assert!(service.metrics().total_ops() >= 1);
    }
}
