//! A connection wired to an in-memory peer that plays the remote side of
//! registrations and invocations.
#![allow(dead_code)]

use std::time::Duration;

use itermctl_client::protocol::{
    ClientMessage, ClientRequest, Notification, NotificationRequest, NotificationResponse,
    NotificationStatus, RpcArgument, RpcResultRequest, ServerBody, ServerMessage,
    ServerOriginatedRpc, ServerOriginatedRpcNotification,
};
use itermctl_client::{memory_transport, ClientConfig, Connection, MemoryPeer};
use itermctl_rpc::{register, Registration, RpcDescriptor, RpcHandler};

pub struct TestRemote {
    pub conn: Connection,
    pub peer: MemoryPeer,
}

impl TestRemote {
    pub fn start() -> Self {
        let (transport, peer) = memory_transport();
        let conn = Connection::new(transport, ClientConfig::default()).expect("valid config");
        Self { conn, peer }
    }

    pub async fn expect_request(&mut self) -> ClientMessage {
        tokio::time::timeout(Duration::from_secs(30), self.peer.next_request())
            .await
            .expect("timed out waiting for a request")
            .expect("transport closed")
    }

    pub async fn answer_notification_request(
        &mut self,
        status: NotificationStatus,
    ) -> NotificationRequest {
        let message = self.expect_request().await;
        let id = message.id.expect("request carries an id");
        let ClientRequest::Notification(request) = message.request else {
            panic!("expected a notification request, got {}", message.request.kind());
        };
        self.peer.push(ServerMessage::response(
            id,
            ServerBody::NotificationResponse(NotificationResponse { status }),
        ));
        request
    }

    /// Register and accept the registration; returns the request the peer saw.
    pub async fn register<H: RpcHandler>(
        &mut self,
        descriptor: RpcDescriptor,
        handler: H,
    ) -> (Registration, NotificationRequest) {
        let conn = self.conn.clone();
        let (registration, request) = tokio::join!(
            register(&conn, descriptor, handler),
            self.answer_notification_request(NotificationStatus::Ok),
        );
        (registration.expect("registration accepted"), request)
    }

    /// Invoke `name` with JSON-encoded `args` as the remote side would.
    pub fn invoke(&self, request_id: &str, name: &str, args: &[(&str, &str)]) {
        let notification = ServerOriginatedRpcNotification {
            request_id: request_id.to_string(),
            rpc: ServerOriginatedRpc {
                name: name.to_string(),
                arguments: args
                    .iter()
                    .map(|(name, json)| RpcArgument {
                        name: name.to_string(),
                        json_value: json.to_string(),
                    })
                    .collect(),
            },
        };
        assert!(self.peer.push(ServerMessage::from_notification(
            Notification::ServerOriginatedRpc(notification)
        )));
    }

    pub async fn expect_result(&mut self) -> RpcResultRequest {
        let message = self.expect_request().await;
        match message.request {
            ClientRequest::RpcResult(result) => result,
            other => panic!("expected an rpc result, got {}", other.kind()),
        }
    }
}
