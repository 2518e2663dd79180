use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters for one connection.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
    lost: AtomicU64,
    receivers_closed: AtomicU64,
}

impl ConnectionStats {
    /// Messages handed to a receiver's consumer.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Messages a receiver accepted but did not take in time.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Inbound messages no receiver accepted.
    pub fn lost(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }

    /// Receivers removed from the registry, by deletion or shutdown.
    pub fn receivers_closed(&self) -> u64 {
        self.receivers_closed.load(Ordering::Relaxed)
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lost(&self) {
        self.lost.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_closed(&self) {
        self.receivers_closed.fetch_add(1, Ordering::Relaxed);
    }
}
