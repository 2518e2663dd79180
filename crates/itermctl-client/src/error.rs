//! Error types for the connection core

use std::time::Duration;

use itermctl_protocol::{InvocationErrorStatus, MessageId, Rejection};
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for connection operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by a [`Connection`](crate::Connection) and the handles it
/// hands out.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The connection has shut down, or is shutting down.
    #[error("connection is closed")]
    Closed,

    /// The process-wide message id sequence is exhausted.
    #[error("cannot correlate a request without a message id")]
    NoMessageId,

    #[error("no response to message {id} within {timeout:?}")]
    Timeout { id: MessageId, timeout: Duration },

    #[error("request {id} was cancelled")]
    Cancelled { id: MessageId },

    /// The remote side answered the request with an error.
    #[error("error response to message {id}: {reason}")]
    Server { id: MessageId, reason: String },

    /// The response did not carry the payload the request expects.
    #[error("unexpected {actual} in response to message {id}, expected {expected}")]
    UnexpectedResponse {
        id: MessageId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("subscription rejected: {0}")]
    Rejected(Rejection),

    /// A remote function invocation failed.
    #[error("{status}: {reason}")]
    Invocation {
        status: InvocationErrorStatus,
        reason: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// The rejection, if this error is a refused subscription.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }
}
