//! Receiver registry owned by the dispatcher task
//!
//! Each registered receiver gets a lane and a pump task that moves messages
//! from the lane into the consumer's bounded channel. The dispatcher only
//! ever pushes into lanes, so a slow consumer holds up nothing but its own
//! pump, and per-receiver arrival order is kept.
//!
//! Every message is stamped with a delivery deadline when it is routed. A
//! message still undelivered at its deadline is dropped, so no message waits
//! longer than one `delivery_timeout` and a stalled lane holds at most what
//! arrives within that window.

use std::sync::Arc;
use std::time::Duration;

use itermctl_protocol::ServerMessage;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::receiver::{AcceptFn, ReceiverEntry, ReceiverId};
use crate::stats::ConnectionStats;

struct Registered {
    id: ReceiverId,
    name: Arc<str>,
    accept: AcceptFn,
    lane: mpsc::UnboundedSender<Queued>,
}

/// A routed message and the instant after which it is no longer delivered.
struct Queued {
    message: Arc<ServerMessage>,
    deadline: Instant,
}

pub(crate) struct ReceiverRegistry {
    receivers: Vec<Registered>,
    delivery_timeout: Duration,
    stats: Arc<ConnectionStats>,
}

impl ReceiverRegistry {
    pub(crate) fn new(delivery_timeout: Duration, stats: Arc<ConnectionStats>) -> Self {
        Self {
            receivers: Vec::new(),
            delivery_timeout,
            stats,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.receivers.len()
    }

    pub(crate) fn add(&mut self, entry: ReceiverEntry) {
        let (lane, queue) = mpsc::unbounded_channel();
        tokio::spawn(pump(
            Arc::clone(&entry.name),
            queue,
            entry.sink,
            Arc::clone(&self.stats),
        ));

        debug!(receiver = %entry.name, id = %entry.id, "receiver added");
        self.receivers.push(Registered {
            id: entry.id,
            name: entry.name,
            accept: entry.accept,
            lane,
        });
    }

    /// Remove a receiver. Its consumer sees end-of-stream after draining what
    /// was already accepted. Unknown ids are ignored.
    pub(crate) fn delete(&mut self, id: ReceiverId) -> bool {
        let Some(index) = self.receivers.iter().position(|r| r.id == id) else {
            return false;
        };
        let removed = self.receivers.remove(index);
        self.stats.record_closed();
        debug!(receiver = %removed.name, id = %removed.id, "receiver deleted");
        true
    }

    /// Offer `message` to every receiver. Returns how many accepted it.
    pub(crate) fn dispatch(&mut self, message: ServerMessage) -> usize {
        let message = Arc::new(message);
        let deadline = Instant::now() + self.delivery_timeout;
        let mut accepted = 0;

        for receiver in &self.receivers {
            if !(receiver.accept)(&message) {
                continue;
            }
            accepted += 1;
            let queued = Queued {
                message: Arc::clone(&message),
                deadline,
            };
            if receiver.lane.send(queued).is_err() {
                // Consumer dropped; its delete command is already queued.
                debug!(receiver = %receiver.name, "receiver gone before deregistration");
            }
        }

        if accepted == 0 {
            self.stats.record_lost();
            warn!(
                message_id = ?message.id,
                kind = message.kind(),
                "message lost: no receiver accepted it"
            );
        }
        accepted
    }

    /// Close every receiver. Returns how many were closed.
    pub(crate) fn close_all(&mut self) -> usize {
        let count = self.receivers.len();
        for receiver in self.receivers.drain(..) {
            self.stats.record_closed();
            debug!(receiver = %receiver.name, "receiver closed at shutdown");
        }
        count
    }
}

async fn pump(
    name: Arc<str>,
    mut queue: mpsc::UnboundedReceiver<Queued>,
    sink: mpsc::Sender<Arc<ServerMessage>>,
    stats: Arc<ConnectionStats>,
) {
    while let Some(Queued { message, deadline }) = queue.recv().await {
        let now = Instant::now();
        let undelivered = if deadline <= now {
            match sink.try_send(message) {
                Ok(()) => None,
                Err(TrySendError::Full(message)) => Some(message),
                Err(TrySendError::Closed(_)) => break,
            }
        } else {
            match sink.send_timeout(message, deadline - now).await {
                Ok(()) => None,
                Err(SendTimeoutError::Timeout(message)) => Some(message),
                Err(SendTimeoutError::Closed(_)) => break,
            }
        };

        match undelivered {
            None => stats.record_delivered(),
            Some(message) => {
                stats.record_dropped();
                warn!(
                    receiver = %name,
                    message_id = ?message.id,
                    kind = message.kind(),
                    "receiver not keeping up, message dropped"
                );
            }
        }
    }
}
