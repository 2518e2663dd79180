//! Message identifiers.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide sequence backing [`MessageId::next`].
static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier correlating an outbound request with its response.
///
/// Identifiers are drawn from a single process-wide sequence, so they are
/// unique across every connection opened by the process and are never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(NonZeroU64);

impl MessageId {
    /// Take the next identifier from the process-wide sequence.
    ///
    /// Returns `None` once the sequence is exhausted; identifiers are never
    /// reused.
    pub fn next() -> Option<Self> {
        NEXT_MESSAGE_ID
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(1)
            })
            .ok()
            .and_then(NonZeroU64::new)
            .map(Self)
    }

    /// Wrap a raw identifier received from the wire. Zero is not a valid id.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
