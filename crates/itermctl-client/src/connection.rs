//! The dispatcher
//!
//! A [`Connection`] is a cheap, cloneable handle to a single background task
//! that owns the transport and the receiver registry. Every mutation of the
//! registry and every outbound write goes through that task as a command,
//! so registry changes and inbound routing are observed in one total order.
//!
//! Shutdown starts when the transport's inbound stream ends or when
//! [`Connection::close`] is called. The task then stops accepting commands,
//! fails the ones still queued with [`ClientError::Closed`], closes every
//! receiver exactly once and closes the transport.

use std::sync::Arc;

use itermctl_protocol::{ClientMessage, MessageId};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::receiver::{receiver_pair, AcceptFn, Receiver, ReceiverEntry, ReceiverId};
use crate::registry::ReceiverRegistry;
use crate::stats::ConnectionStats;
use crate::transport::Transport;

pub(crate) enum Command {
    AddReceiver(ReceiverEntry),
    DeleteReceiver(ReceiverId),
    Send {
        message: ClientMessage,
        reply: oneshot::Sender<Result<MessageId>>,
    },
    ReceiverCount(oneshot::Sender<usize>),
}

struct Shared {
    commands: mpsc::UnboundedSender<Command>,
    /// Cancelled when shutdown begins.
    closing: CancellationToken,
    /// Cancelled when shutdown has finished.
    closed: CancellationToken,
    stats: Arc<ConnectionStats>,
    config: ClientConfig,
}

/// Handle to a multiplexed connection.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    /// Start the dispatcher task for `transport`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<T: Transport>(transport: T, config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let (commands, command_rx) = mpsc::unbounded_channel();
        let stats = Arc::new(ConnectionStats::default());
        let closing = CancellationToken::new();
        let closed = CancellationToken::new();

        let dispatcher = Dispatcher {
            transport,
            commands: command_rx,
            registry: ReceiverRegistry::new(config.delivery_timeout(), Arc::clone(&stats)),
            closing: closing.clone(),
            closed: closed.clone(),
        };
        tokio::spawn(dispatcher.run());

        Ok(Self {
            shared: Arc::new(Shared {
                commands,
                closing,
                closed,
                stats,
                config,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.shared.stats
    }

    /// Register a receiver for the inbound messages `accept` selects.
    ///
    /// The registration is queued to the dispatcher; messages routed after it
    /// is processed are delivered. Fails with [`ClientError::Closed`] once
    /// shutdown has begun.
    pub fn add_receiver(&self, name: impl Into<String>, accept: AcceptFn) -> Result<Receiver> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let (entry, receiver) = receiver_pair(
            name.into(),
            accept,
            self.shared.config.receiver_capacity,
            self.shared.commands.clone(),
        );
        self.shared
            .commands
            .send(Command::AddReceiver(entry))
            .map_err(|_| ClientError::Closed)?;
        Ok(receiver)
    }

    /// Write a message without waiting for any response.
    ///
    /// A message without an id is assigned the next one from the process-wide
    /// sequence; the id actually written is returned.
    pub async fn send(&self, message: ClientMessage) -> Result<MessageId> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Send { message, reply })?;
        response.await.map_err(|_| ClientError::Closed)?
    }

    /// Number of currently registered receivers.
    pub async fn receiver_count(&self) -> Result<usize> {
        let (reply, count) = oneshot::channel();
        self.command(Command::ReceiverCount(reply))?;
        count.await.map_err(|_| ClientError::Closed)
    }

    /// Begin shutdown. Idempotent.
    pub fn close(&self) {
        self.shared.closing.cancel();
    }

    /// Whether shutdown has begun.
    pub fn is_closed(&self) -> bool {
        self.shared.closing.is_cancelled()
    }

    /// Wait until shutdown has completed: every receiver is closed and the
    /// transport has been released.
    pub async fn closed(&self) {
        self.shared.closed.cancelled().await
    }

    /// Wait until shutdown begins.
    pub(crate) async fn closing(&self) {
        self.shared.closing.cancelled().await
    }

    fn command(&self, command: Command) -> Result<()> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        self.shared
            .commands
            .send(command)
            .map_err(|_| ClientError::Closed)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .field("config", &self.shared.config)
            .finish()
    }
}

struct Dispatcher<T> {
    transport: T,
    commands: mpsc::UnboundedReceiver<Command>,
    registry: ReceiverRegistry,
    closing: CancellationToken,
    closed: CancellationToken,
}

impl<T: Transport> Dispatcher<T> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.closing.cancelled() => {
                    debug!("connection close requested");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => {
                        debug!("all connection handles dropped");
                        break;
                    }
                },
                inbound = self.transport.recv() => match inbound {
                    Some(message) => {
                        let accepted = self.registry.dispatch(message);
                        tracing::trace!(accepted, "message routed");
                    }
                    None => {
                        debug!("transport closed by remote side");
                        break;
                    }
                },
            }
        }

        self.shutdown().await;
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::AddReceiver(entry) => self.registry.add(entry),
            Command::DeleteReceiver(id) => {
                self.registry.delete(id);
            }
            Command::Send { message, reply } => {
                let result = self.write(message).await;
                let _ = reply.send(result);
            }
            Command::ReceiverCount(reply) => {
                let _ = reply.send(self.registry.len());
            }
        }
    }

    async fn write(&mut self, mut message: ClientMessage) -> Result<MessageId> {
        let id = match message.id {
            Some(id) => id,
            None => {
                let id = MessageId::next().ok_or(ClientError::NoMessageId)?;
                message.id = Some(id);
                id
            }
        };
        let kind = message.request.kind();

        if let Err(e) = self.transport.send(message).await {
            error!(message_id = %id, kind, error = %e, "failed to write message");
            return Err(e.into());
        }
        debug!(message_id = %id, kind, "message sent");
        Ok(id)
    }

    async fn shutdown(mut self) {
        self.closing.cancel();
        self.commands.close();

        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::AddReceiver(entry) => {
                    debug!(receiver = %entry.name, "registration refused during shutdown");
                }
                Command::DeleteReceiver(id) => {
                    self.registry.delete(id);
                }
                Command::Send { reply, .. } => {
                    let _ = reply.send(Err(ClientError::Closed));
                }
                Command::ReceiverCount(reply) => {
                    let _ = reply.send(self.registry.len());
                }
            }
        }

        let receivers = self.registry.close_all();
        if let Err(e) = self.transport.close().await {
            error!(error = %e, "failed to close transport");
        }
        debug!(receivers, "connection closed");
        self.closed.cancel();
    }
}
