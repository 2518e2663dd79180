//! In-process transport
//!
//! [`memory_transport`] returns a connected pair: the [`MemoryTransport`] half
//! is handed to a [`Connection`](crate::Connection), the [`MemoryPeer`] half
//! plays the remote application. Used by the test suites of this workspace
//! and handy for embedding the core without a socket.

use async_trait::async_trait;
use itermctl_protocol::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::transport::{Transport, TransportError};

/// Create a connected transport/peer pair.
pub fn memory_transport() -> (MemoryTransport, MemoryPeer) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let closed = CancellationToken::new();

    let transport = MemoryTransport {
        outbound: outbound_tx,
        inbound: inbound_rx,
        closed: closed.clone(),
    };
    let peer = MemoryPeer {
        inbound: Some(inbound_tx),
        outbound: outbound_rx,
        closed,
    };
    (transport, peer)
}

pub struct MemoryTransport {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    closed: CancellationToken,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(message)
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<ServerMessage> {
        self.inbound.recv().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inbound.close();
        self.closed.cancel();
        Ok(())
    }
}

/// The remote end of a [`MemoryTransport`].
pub struct MemoryPeer {
    inbound: Option<mpsc::UnboundedSender<ServerMessage>>,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    closed: CancellationToken,
}

impl MemoryPeer {
    /// Deliver a message to the local side. Returns `false` once the
    /// transport is gone or the peer has disconnected.
    pub fn push(&self, message: ServerMessage) -> bool {
        match &self.inbound {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Next message written by the local side, in send order.
    pub async fn next_request(&mut self) -> Option<ClientMessage> {
        self.outbound.recv().await
    }

    pub fn try_next_request(&mut self) -> Option<ClientMessage> {
        self.outbound.try_recv().ok()
    }

    /// End the inbound stream, as if the remote application went away.
    pub fn disconnect(&mut self) {
        self.inbound = None;
    }

    /// Whether the local side has closed the transport.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Wait until the local side closes the transport.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}
