//! Common test utilities: a connection wired to an in-memory remote side.
#![allow(dead_code)]

use std::time::Duration;

use itermctl_client::protocol::{
    ClientMessage, ClientRequest, InvokeFunctionResponse, MessageId, Notification,
    NotificationRequest, NotificationResponse, NotificationStatus, ServerBody, ServerMessage,
};
use itermctl_client::{memory_transport, ClientConfig, Connection, MemoryPeer};

/// A connection plus the peer playing the remote application.
pub struct TestRemote {
    pub conn: Connection,
    pub peer: MemoryPeer,
}

impl TestRemote {
    pub fn start() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let (transport, peer) = memory_transport();
        let conn = Connection::new(transport, config).expect("valid config");
        Self { conn, peer }
    }

    /// Next outbound message; fails the test if nothing arrives.
    pub async fn expect_request(&mut self) -> ClientMessage {
        tokio::time::timeout(Duration::from_secs(30), self.peer.next_request())
            .await
            .expect("timed out waiting for a request")
            .expect("transport closed")
    }

    /// Read the next notification request and answer it with `status`.
    pub async fn answer_notification_request(
        &mut self,
        status: NotificationStatus,
    ) -> NotificationRequest {
        let message = self.expect_request().await;
        let id = message.id.expect("request carries an id");
        let ClientRequest::Notification(request) = message.request else {
            panic!("expected a notification request, got {}", message.request.kind());
        };
        self.peer.push(notification_response(id, status));
        request
    }

    pub fn notify(&self, notification: Notification) {
        assert!(self.peer.push(ServerMessage::from_notification(notification)));
    }

    /// Round-trip a request so every message pushed before this call has
    /// been routed by the dispatcher.
    pub async fn sync(&mut self) {
        let conn = self.conn.clone();
        let peer = &mut self.peer;
        let (result, ()) = tokio::join!(
            conn.invoke_function::<serde_json::Value>("sync()"),
            async {
                let message = peer.next_request().await.expect("sync request");
                peer.push(invoke_success(message.id.expect("id"), "null"));
            }
        );
        result.expect("sync round trip");
    }
}

pub fn notification_response(id: MessageId, status: NotificationStatus) -> ServerMessage {
    ServerMessage::response(
        id,
        ServerBody::NotificationResponse(NotificationResponse { status }),
    )
}

pub fn invoke_success(id: MessageId, json_result: &str) -> ServerMessage {
    ServerMessage::response(
        id,
        ServerBody::InvokeFunctionResponse(InvokeFunctionResponse::Success {
            json_result: json_result.to_string(),
        }),
    )
}

pub fn new_session(session_id: &str) -> Notification {
    Notification::NewSession {
        session_id: session_id.to_string(),
    }
}
