//! Connection multiplexing for the iTerm2 API
//!
//! A [`Connection`] owns one [`Transport`] and demultiplexes its inbound
//! messages to any number of filtered [`Receiver`]s. Built on top of that:
//!
//! - [`Connection::request`]: one request, one correlated response, with a
//!   timeout and optional cancellation.
//! - [`Connection::subscribe`]: a notification stream with a subscribe
//!   handshake and a best-effort unsubscribe when it is cancelled.
//! - [`Connection::invoke_function`]: call a function on the remote side and
//!   decode its JSON result.
//!
//! The transport itself (socket, framing, authentication) is supplied by the
//! caller; [`memory_transport`] provides an in-process pair.

pub mod config;
mod connection;
mod error;
pub mod logging;
mod memory;
mod receiver;
mod registry;
mod request;
mod stats;
mod subscription;
mod transport;

pub use config::ClientConfig;
pub use connection::Connection;
pub use error::{ClientError, Result};
pub use memory::{memory_transport, MemoryPeer, MemoryTransport};
pub use receiver::{
    accept_all, accept_both, accept_message_id, accept_notification_type, AcceptFn, Receiver,
    ReceiverId,
};
pub use request::RequestOptions;
pub use stats::ConnectionStats;
pub use subscription::{Subscription, SubscriptionCanceller, SubscriptionState};
pub use transport::{Transport, TransportError};

pub use itermctl_protocol as protocol;
