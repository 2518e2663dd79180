//! Receivers: named, filtered views of the inbound message stream
//!
//! A [`Receiver`] is created through
//! [`Connection::add_receiver`](crate::Connection::add_receiver). The
//! dispatcher offers every inbound message to every registered receiver
//! whose accept predicate returns true; messages a receiver accepts are
//! yielded from it in arrival order.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use itermctl_protocol::{MessageId, NotificationType, ServerMessage};
use tokio::sync::mpsc;

use crate::connection::Command;

static RECEIVER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a registered receiver. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(u64);

impl ReceiverId {
    fn next() -> Self {
        Self(RECEIVER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "receiver-{}", self.0)
    }
}

/// Predicate deciding whether a receiver wants a message.
///
/// Runs on the dispatcher task for every inbound message, so it must be
/// cheap and must not block.
pub type AcceptFn = Arc<dyn Fn(&ServerMessage) -> bool + Send + Sync>;

pub fn accept_all() -> AcceptFn {
    Arc::new(|_| true)
}

/// Accept only the response correlated with `id`.
pub fn accept_message_id(id: MessageId) -> AcceptFn {
    Arc::new(move |msg| msg.id == Some(id))
}

/// Accept notifications of one type.
pub fn accept_notification_type(notification_type: NotificationType) -> AcceptFn {
    Arc::new(move |msg| {
        msg.notification()
            .is_some_and(|n| n.notification_type() == notification_type)
    })
}

/// Accept what both predicates accept.
pub fn accept_both(first: AcceptFn, second: AcceptFn) -> AcceptFn {
    Arc::new(move |msg| first(msg) && second(msg))
}

/// Registration half of a receiver, handed to the dispatcher.
pub(crate) struct ReceiverEntry {
    pub(crate) id: ReceiverId,
    pub(crate) name: Arc<str>,
    pub(crate) accept: AcceptFn,
    pub(crate) sink: mpsc::Sender<Arc<ServerMessage>>,
}

/// Sends the delete command for a receiver at most once.
#[derive(Clone)]
pub(crate) struct Deregistration {
    id: ReceiverId,
    commands: mpsc::UnboundedSender<Command>,
    done: Arc<AtomicBool>,
}

impl Deregistration {
    pub(crate) fn deregister(&self) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }
        // A closed command channel means shutdown already closed every receiver.
        let _ = self.commands.send(Command::DeleteReceiver(self.id));
    }
}

/// Build both halves of a receiver.
pub(crate) fn receiver_pair(
    name: String,
    accept: AcceptFn,
    capacity: usize,
    commands: mpsc::UnboundedSender<Command>,
) -> (ReceiverEntry, Receiver) {
    let id = ReceiverId::next();
    let name: Arc<str> = name.into();
    let (sink, messages) = mpsc::channel(capacity);

    let entry = ReceiverEntry {
        id,
        name: Arc::clone(&name),
        accept,
        sink,
    };
    let receiver = Receiver {
        id,
        name,
        messages,
        deregistration: Deregistration {
            id,
            commands,
            done: Arc::new(AtomicBool::new(false)),
        },
    };
    (entry, receiver)
}

/// Consumer end of a registered receiver.
///
/// Dropping the receiver deregisters it. Once deregistered, or once the
/// connection shuts down, [`recv`](Self::recv) drains whatever was already
/// accepted and then returns `None`.
pub struct Receiver {
    id: ReceiverId,
    name: Arc<str>,
    messages: mpsc::Receiver<Arc<ServerMessage>>,
    deregistration: Deregistration,
}

impl Receiver {
    pub fn id(&self) -> ReceiverId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn recv(&mut self) -> Option<Arc<ServerMessage>> {
        self.messages.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Arc<ServerMessage>> {
        self.messages.try_recv().ok()
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Arc<ServerMessage>>> {
        self.messages.poll_recv(cx)
    }

    /// Remove this receiver from the connection. Idempotent.
    pub fn deregister(&self) {
        self.deregistration.deregister();
    }

    pub(crate) fn deregistration(&self) -> Deregistration {
        self.deregistration.clone()
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.deregistration.deregister();
    }
}

impl Stream for Receiver {
    type Item = Arc<ServerMessage>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_recv(cx)
    }
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
