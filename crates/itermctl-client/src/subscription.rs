//! Long-lived notification subscriptions
//!
//! Subscribing registers a receiver for the notification type, then performs
//! the subscribe handshake. A rejected handshake drops the receiver again, so
//! nothing is left in the registry. An accepted one returns a
//! [`Subscription`] plus a background teardown task that waits for the
//! subscription's cancellation token (or for the connection to close),
//! deregisters the receiver and sends the matching unsubscribe request once.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use itermctl_protocol::{
    ClientMessage, MessageId, Notification, NotificationRequest, NotificationType, Rejection,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::receiver::{
    accept_both, accept_notification_type, AcceptFn, Deregistration, Receiver,
};
use crate::request::unexpected;

/// Lifecycle of a [`Subscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Idle,
    Subscribing,
    Active,
    Unsubscribing,
    Closed,
}

/// Cancels a [`Subscription`] from elsewhere, e.g. another task.
#[derive(Debug, Clone)]
pub struct SubscriptionCanceller {
    token: CancellationToken,
}

impl SubscriptionCanceller {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A stream of notifications of one type.
///
/// Cancelling (or dropping) the subscription starts teardown. Notifications
/// accepted before teardown are still yielded; the stream then ends.
pub struct Subscription {
    notification_type: NotificationType,
    receiver: Receiver,
    token: CancellationToken,
    state: watch::Receiver<SubscriptionState>,
}

impl Subscription {
    pub fn notification_type(&self) -> NotificationType {
        self.notification_type
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Next notification, or `None` once the subscription is torn down.
    pub async fn next(&mut self) -> Option<Notification> {
        loop {
            let message = self.receiver.recv().await?;
            if let Some(notification) = message.notification() {
                return Some(notification.clone());
            }
        }
    }

    /// Start teardown. Cancelling more than once is a no-op.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn canceller(&self) -> SubscriptionCanceller {
        SubscriptionCanceller {
            token: self.token.clone(),
        }
    }

    /// Wait until teardown has finished, including the unsubscribe attempt.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        let _ = state
            .wait_for(|s| *s == SubscriptionState::Closed)
            .await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl Stream for Subscription {
    type Item = Notification;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match futures::ready!(this.receiver.poll_recv(cx)) {
                Some(message) => {
                    if let Some(notification) = message.notification() {
                        return Poll::Ready(Some(notification.clone()));
                    }
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("notification_type", &self.notification_type)
            .field("state", &self.state())
            .finish()
    }
}

impl Connection {
    /// Subscribe until the returned [`Subscription`] is cancelled or dropped.
    pub async fn subscribe(&self, request: NotificationRequest) -> Result<Subscription> {
        self.subscribe_filtered(request, None, None).await
    }

    /// Subscribe until `scope` (or the subscription itself) is cancelled.
    pub async fn subscribe_scoped(
        &self,
        request: NotificationRequest,
        scope: &CancellationToken,
    ) -> Result<Subscription> {
        self.subscribe_filtered(request, Some(scope), None).await
    }

    /// Subscribe, additionally narrowing which notifications of the type are
    /// delivered with `filter`.
    ///
    /// "Already subscribed" is treated as success; in that case the remote
    /// subscription belongs to someone else and teardown sends no
    /// unsubscribe.
    pub async fn subscribe_filtered(
        &self,
        mut request: NotificationRequest,
        scope: Option<&CancellationToken>,
        filter: Option<AcceptFn>,
    ) -> Result<Subscription> {
        let (state, state_rx) = watch::channel(SubscriptionState::Idle);
        request.subscribe = true;
        let notification_type = request.notification_type;

        let accept = match filter {
            Some(filter) => accept_both(accept_notification_type(notification_type), filter),
            None => accept_notification_type(notification_type),
        };

        state.send_replace(SubscriptionState::Subscribing);
        let receiver = self.add_receiver(format!("{notification_type} subscription"), accept)?;

        let id = MessageId::next().ok_or(ClientError::NoMessageId)?;
        let response = self
            .request(ClientMessage::new(request.clone()).with_id(id))
            .await?;
        let status = response
            .notification_response()
            .map(|r| r.status)
            .ok_or_else(|| unexpected(id, &response, "notification_response"))?;

        let owns_remote = match status.rejection() {
            None => true,
            Some(Rejection::AlreadySubscribed) => {
                debug!(%notification_type, session = %request.session, "already subscribed");
                false
            }
            Some(rejection) => {
                debug!(%notification_type, %rejection, "subscription rejected");
                return Err(ClientError::Rejected(rejection));
            }
        };

        let token = match scope {
            Some(scope) => scope.child_token(),
            None => CancellationToken::new(),
        };
        state.send_replace(SubscriptionState::Active);

        tokio::spawn(teardown(
            self.clone(),
            request,
            receiver.deregistration(),
            token.clone(),
            state,
            owns_remote,
        ));

        Ok(Subscription {
            notification_type,
            receiver,
            token,
            state: state_rx,
        })
    }
}

async fn teardown(
    conn: Connection,
    request: NotificationRequest,
    deregistration: Deregistration,
    token: CancellationToken,
    state: watch::Sender<SubscriptionState>,
    owns_remote: bool,
) {
    let connection_closed = tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = conn.closing() => true,
    };

    state.send_replace(SubscriptionState::Unsubscribing);
    deregistration.deregister();

    let notification_type = request.notification_type;
    if connection_closed || conn.is_closed() || !owns_remote {
        state.send_replace(SubscriptionState::Closed);
        return;
    }

    match conn
        .request(ClientMessage::new(request.unsubscribe_request()))
        .await
    {
        Ok(response) => match response.notification_response().map(|r| r.status.rejection()) {
            Some(None) => debug!(%notification_type, "unsubscribed"),
            Some(Some(rejection)) => {
                warn!(%notification_type, %rejection, "unsubscribe rejected")
            }
            None => warn!(
                %notification_type,
                kind = response.kind(),
                "unexpected response to unsubscribe"
            ),
        },
        Err(e) => error!(%notification_type, error = %e, "failed to unsubscribe"),
    }
    state.send_replace(SubscriptionState::Closed);
}
