//! Error types for RPC registration and invocation decoding

use itermctl_client::ClientError;
use thiserror::Error;

/// Result type alias for RPC operations
pub type Result<T> = std::result::Result<T, RpcError>;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("callable must have a name")]
    UnnamedRpc,

    #[error("argument must have a name")]
    UnnamedArgument,

    #[error("argument {0:?} declared more than once")]
    DuplicateArgument(String),

    #[error("argument name {0:?} is reserved")]
    ReservedArgument(String),

    #[error("argument {name:?} has unsupported type {type_name:?}")]
    UnsupportedType { name: String, type_name: String },

    #[error("knob must have a key")]
    UnnamedKnob,

    #[error("knob {key:?} has invalid default {value}: expected a finite number above zero")]
    InvalidKnobDefault { key: String, value: f64 },

    #[error("no argument named {0:?}")]
    MissingArgument(String),

    #[error("no argument named 'knobs'")]
    NoKnobsArgument,

    #[error("cannot decode argument {name:?}: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot decode knobs: {0}")]
    Knobs(#[source] serde_json::Error),

    /// A status-bar-only operation was used from another kind of registration.
    #[error("invocation does not belong to a status bar component")]
    NotAStatusBar,

    #[error(transparent)]
    Client(#[from] ClientError),
}
