//! Notification subscription types
//!
//! Notifications are pushed by the remote application without a matching
//! request id. A [`NotificationRequest`] subscribes to (or unsubscribes from)
//! one [`NotificationType`], optionally scoped to a session and carrying
//! role-specific arguments such as an RPC registration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rpc::{RpcRegistrationRequest, ServerOriginatedRpcNotification};

/// Session filter meaning "every session".
pub const ALL_SESSIONS: &str = "all";

/// Kinds of notification the remote application can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Keystroke,
    ScreenUpdate,
    Prompt,
    LocationChange,
    CustomEscapeSequence,
    VariableChange,
    NewSession,
    TerminateSession,
    LayoutChange,
    FocusChange,
    ServerOriginatedRpc,
    BroadcastChange,
    ProfileChange,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keystroke => "NOTIFY_ON_KEYSTROKE",
            Self::ScreenUpdate => "NOTIFY_ON_SCREEN_UPDATE",
            Self::Prompt => "NOTIFY_ON_PROMPT",
            Self::LocationChange => "NOTIFY_ON_LOCATION_CHANGE",
            Self::CustomEscapeSequence => "NOTIFY_ON_CUSTOM_ESCAPE_SEQUENCE",
            Self::VariableChange => "NOTIFY_ON_VARIABLE_CHANGE",
            Self::NewSession => "NOTIFY_ON_NEW_SESSION",
            Self::TerminateSession => "NOTIFY_ON_TERMINATE_SESSION",
            Self::LayoutChange => "NOTIFY_ON_LAYOUT_CHANGE",
            Self::FocusChange => "NOTIFY_ON_FOCUS_CHANGE",
            Self::ServerOriginatedRpc => "NOTIFY_ON_SERVER_ORIGINATED_RPC",
            Self::BroadcastChange => "NOTIFY_ON_BROADCAST_CHANGE",
            Self::ProfileChange => "NOTIFY_ON_PROFILE_CHANGE",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an unsolicited notification.
///
/// Only the kinds the connection core routes on are modelled in detail;
/// everything else travels as an opaque [`Notification::Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    NewSession {
        session_id: String,
    },
    TerminateSession {
        session_id: String,
    },
    CustomEscapeSequence {
        session_id: String,
        sender_identity: String,
        payload: String,
    },
    ServerOriginatedRpc(ServerOriginatedRpcNotification),
    Event {
        notification_type: NotificationType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(default)]
        payload: Value,
    },
}

impl Notification {
    /// Classify the payload.
    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::NewSession { .. } => NotificationType::NewSession,
            Self::TerminateSession { .. } => NotificationType::TerminateSession,
            Self::CustomEscapeSequence { .. } => NotificationType::CustomEscapeSequence,
            Self::ServerOriginatedRpc(_) => NotificationType::ServerOriginatedRpc,
            Self::Event {
                notification_type, ..
            } => *notification_type,
        }
    }

    pub fn server_originated_rpc(&self) -> Option<&ServerOriginatedRpcNotification> {
        match self {
            Self::ServerOriginatedRpc(rpc) => Some(rpc),
            _ => None,
        }
    }
}

/// Role-specific arguments attached to a subscription request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SubscriptionArguments {
    RpcRegistration(RpcRegistrationRequest),
    Other(Value),
}

/// Request used both to subscribe and to unsubscribe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub session: String,
    pub subscribe: bool,
    pub notification_type: NotificationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<SubscriptionArguments>,
}

impl NotificationRequest {
    /// Build a request for `notification_type`. An empty session subscribes
    /// to all sessions.
    pub fn new(
        subscribe: bool,
        notification_type: NotificationType,
        session: impl Into<String>,
    ) -> Self {
        let mut session = session.into();
        if session.is_empty() {
            session = ALL_SESSIONS.to_string();
        }

        Self {
            session,
            subscribe,
            notification_type,
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: SubscriptionArguments) -> Self {
        self.arguments = Some(arguments);
        self
    }

    /// The matching unsubscribe request: same filter and role arguments,
    /// `subscribe` cleared.
    pub fn unsubscribe_request(&self) -> Self {
        Self {
            subscribe: false,
            ..self.clone()
        }
    }

    pub fn rpc_registration(&self) -> Option<&RpcRegistrationRequest> {
        match &self.arguments {
            Some(SubscriptionArguments::RpcRegistration(registration)) => Some(registration),
            _ => None,
        }
    }
}

/// Status carried by the response to a [`NotificationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Ok,
    SessionNotFound,
    RequestMalformed,
    NotSubscribed,
    AlreadySubscribed,
    DuplicateServerOriginatedRpc,
    InvalidIdentifier,
}

impl NotificationStatus {
    /// The rejection this status represents, or `None` for success.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Ok => None,
            Self::SessionNotFound => Some(Rejection::SessionNotFound),
            Self::RequestMalformed => Some(Rejection::RequestMalformed),
            Self::NotSubscribed => Some(Rejection::NotSubscribed),
            Self::AlreadySubscribed => Some(Rejection::AlreadySubscribed),
            Self::DuplicateServerOriginatedRpc => Some(Rejection::DuplicateServerOriginatedRpc),
            Self::InvalidIdentifier => Some(Rejection::InvalidIdentifier),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub status: NotificationStatus,
}

/// A subscription request refused by the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    SessionNotFound,
    RequestMalformed,
    NotSubscribed,
    AlreadySubscribed,
    DuplicateServerOriginatedRpc,
    InvalidIdentifier,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::SessionNotFound => "session not found",
            Self::RequestMalformed => "request malformed",
            Self::NotSubscribed => "not subscribed",
            Self::AlreadySubscribed => "already subscribed",
            Self::DuplicateServerOriginatedRpc => "duplicate server-originated RPC registration",
            Self::InvalidIdentifier => "invalid identifier",
        };
        f.write_str(text)
    }
}
