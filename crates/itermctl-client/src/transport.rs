//! Transport contract
//!
//! A transport moves whole messages in both directions. Framing, encoding and
//! authentication live behind this trait; the [`Connection`](crate::Connection)
//! owns the transport exclusively and is its only caller.

use async_trait::async_trait;
use itermctl_protocol::{ClientMessage, ServerMessage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Bidirectional message channel to the remote application.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Write one message.
    async fn send(&mut self, message: ClientMessage) -> Result<(), TransportError>;

    /// Wait for the next inbound message. `None` means the transport has ended
    /// and no further messages will arrive.
    ///
    /// This future is raced against other events and dropped when it loses,
    /// so it must be cancel-safe: dropping it must not lose a message.
    async fn recv(&mut self) -> Option<ServerMessage>;

    /// Release the underlying resources. Called once, at shutdown.
    async fn close(&mut self) -> Result<(), TransportError>;
}
