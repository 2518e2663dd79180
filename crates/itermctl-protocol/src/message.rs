//! Message envelopes exchanged over a connection.
//!
//! The core only looks at the routing fields: the optional [`MessageId`] and
//! the payload discriminant. Everything else is carried through untouched.

use serde::{Deserialize, Serialize};

use crate::id::MessageId;
use crate::notification::{Notification, NotificationRequest, NotificationResponse};
use crate::rpc::{
    InvokeFunctionRequest, InvokeFunctionResponse, RpcResultRequest, StatusBarComponentRequest,
    StatusBarComponentResponse,
};

/// Outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    pub request: ClientRequest,
}

impl ClientMessage {
    pub fn new(request: impl Into<ClientRequest>) -> Self {
        Self {
            id: None,
            request: request.into(),
        }
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientRequest {
    Notification(NotificationRequest),
    RpcResult(RpcResultRequest),
    InvokeFunction(InvokeFunctionRequest),
    StatusBarComponent(StatusBarComponentRequest),
}

impl ClientRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Notification(_) => "notification_request",
            Self::RpcResult(_) => "rpc_result_request",
            Self::InvokeFunction(_) => "invoke_function_request",
            Self::StatusBarComponent(_) => "status_bar_component_request",
        }
    }
}

impl From<NotificationRequest> for ClientRequest {
    fn from(req: NotificationRequest) -> Self {
        Self::Notification(req)
    }
}

impl From<RpcResultRequest> for ClientRequest {
    fn from(req: RpcResultRequest) -> Self {
        Self::RpcResult(req)
    }
}

impl From<InvokeFunctionRequest> for ClientRequest {
    fn from(req: InvokeFunctionRequest) -> Self {
        Self::InvokeFunction(req)
    }
}

impl From<StatusBarComponentRequest> for ClientRequest {
    fn from(req: StatusBarComponentRequest) -> Self {
        Self::StatusBarComponent(req)
    }
}

/// Inbound message: either a response correlated by `id`, or a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    pub body: ServerBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerBody {
    /// The remote side failed to process the request carrying the same id.
    Error(String),
    NotificationResponse(NotificationResponse),
    InvokeFunctionResponse(InvokeFunctionResponse),
    RpcResultResponse,
    StatusBarComponentResponse(StatusBarComponentResponse),
    Notification(Notification),
}

impl ServerMessage {
    pub fn response(id: MessageId, body: ServerBody) -> Self {
        Self { id: Some(id), body }
    }

    pub fn from_notification(notification: Notification) -> Self {
        Self {
            id: None,
            body: ServerBody::Notification(notification),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.body {
            ServerBody::Error(reason) if !reason.is_empty() => Some(reason),
            _ => None,
        }
    }

    pub fn notification(&self) -> Option<&Notification> {
        match &self.body {
            ServerBody::Notification(n) => Some(n),
            _ => None,
        }
    }

    pub fn notification_response(&self) -> Option<&NotificationResponse> {
        match &self.body {
            ServerBody::NotificationResponse(resp) => Some(resp),
            _ => None,
        }
    }

    pub fn invoke_function_response(&self) -> Option<&InvokeFunctionResponse> {
        match &self.body {
            ServerBody::InvokeFunctionResponse(resp) => Some(resp),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match &self.body {
            ServerBody::Error(_) => "error",
            ServerBody::NotificationResponse(_) => "notification_response",
            ServerBody::InvokeFunctionResponse(_) => "invoke_function_response",
            ServerBody::RpcResultResponse => "rpc_result_response",
            ServerBody::StatusBarComponentResponse(_) => "status_bar_component_response",
            ServerBody::Notification(_) => "notification",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NotificationStatus, NotificationType};

    #[test]
    fn test_client_message_without_id_omits_field() {
        let msg = ClientMessage::new(NotificationRequest::new(
            true,
            NotificationType::NewSession,
            "",
        ));
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["request"]["type"], "notification");
    }

    #[test]
    fn test_server_message_accessors() {
        let id = MessageId::new(3).unwrap();
        let resp = ServerMessage::response(
            id,
            ServerBody::NotificationResponse(NotificationResponse {
                status: NotificationStatus::Ok,
            }),
        );
        assert_eq!(resp.id, Some(id));
        assert!(resp.error().is_none());
        assert!(resp.notification().is_none());
        assert_eq!(
            resp.notification_response().map(|r| r.status),
            Some(NotificationStatus::Ok)
        );

        let err = ServerMessage::response(id, ServerBody::Error("bad request".into()));
        assert_eq!(err.error(), Some("bad request"));

        let empty = ServerMessage::response(id, ServerBody::Error(String::new()));
        assert!(empty.error().is_none());
    }

    #[test]
    fn test_server_message_json_shape() {
        let raw = r#"{"id":9,"body":{"type":"notification","payload":{"kind":"new_session","session_id":"s1"}}}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.id.map(MessageId::get), Some(9));
        assert_eq!(
            msg.notification().map(|n| n.notification_type()),
            Some(NotificationType::NewSession)
        );
    }
}
