//! Registering callables and serving their invocations

use std::sync::Arc;

use anyhow::anyhow;
use itermctl_client::protocol::{ClientMessage, Notification, ServerMessage};
use itermctl_client::{AcceptFn, Connection, Subscription, SubscriptionCanceller};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::descriptor::RpcDescriptor;
use crate::error::{Result, RpcError};
use crate::handler::{encode_result, RpcHandler};
use crate::invocation::{Invocation, StatusBarContext};
use crate::schema::ArgSchema;

/// Handle to a registered callable.
///
/// Dropping the handle leaves the callable registered; use
/// [`Registration::cancel`] or cancel the scope it was registered in.
pub struct Registration {
    name: String,
    canceller: SubscriptionCanceller,
    done: CancellationToken,
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unregister. In-flight invocations still run to completion.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> SubscriptionCanceller {
        self.canceller.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Wait until the callable is unregistered and no longer served.
    pub async fn closed(&self) {
        self.done.cancelled().await;
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Register `descriptor` and serve its invocations with `handler` until the
/// returned registration is cancelled or the connection closes.
pub async fn register<H: RpcHandler>(
    conn: &Connection,
    descriptor: RpcDescriptor,
    handler: H,
) -> Result<Registration> {
    register_inner(conn, descriptor, Arc::new(handler), None).await
}

/// Like [`register`], additionally unregistering when `scope` is cancelled.
pub async fn register_scoped<H: RpcHandler>(
    conn: &Connection,
    descriptor: RpcDescriptor,
    handler: H,
    scope: &CancellationToken,
) -> Result<Registration> {
    register_inner(conn, descriptor, Arc::new(handler), Some(scope)).await
}

async fn register_inner(
    conn: &Connection,
    descriptor: RpcDescriptor,
    handler: Arc<dyn RpcHandler>,
    scope: Option<&CancellationToken>,
) -> Result<Registration> {
    descriptor.validate()?;

    let name = descriptor.name().to_string();
    let request = descriptor.notification_request();
    let subscription = conn
        .subscribe_filtered(request, scope, Some(accept_rpc_named(name.clone())))
        .await
        .map_err(RpcError::Client)?;
    info!(rpc = %name, role = ?descriptor.role().rpc_role(), "registered");

    let status_bar = descriptor
        .role()
        .status_bar_identifier()
        .map(|identifier| StatusBarContext {
            conn: conn.clone(),
            identifier: identifier.to_string(),
        });

    let canceller = subscription.canceller();
    let done = CancellationToken::new();
    let server = Server {
        conn: conn.clone(),
        name: name.clone(),
        schema: Arc::new(descriptor.schema().clone()),
        status_bar,
        handler,
    };
    tokio::spawn(server.run(subscription, done.clone()));

    Ok(Registration {
        name,
        canceller,
        done,
    })
}

fn accept_rpc_named(name: String) -> AcceptFn {
    Arc::new(move |message: &ServerMessage| {
        message
            .notification()
            .and_then(Notification::server_originated_rpc)
            .is_some_and(|rpc| rpc.rpc.name == name)
    })
}

struct Server {
    conn: Connection,
    name: String,
    schema: Arc<ArgSchema>,
    status_bar: Option<StatusBarContext>,
    handler: Arc<dyn RpcHandler>,
}

impl Server {
    async fn run(self, mut subscription: Subscription, done: CancellationToken) {
        while let Some(notification) = subscription.next().await {
            let Some(rpc) = notification.server_originated_rpc() else {
                continue;
            };
            if rpc.rpc.name != self.name {
                continue;
            }

            debug!(rpc = %self.name, request_id = %rpc.request_id, "invoked");
            let invocation = Invocation::decode(rpc, &self.schema, self.status_bar.clone());
            tokio::spawn(respond(
                self.conn.clone(),
                rpc.request_id.clone(),
                invocation,
                self.handler.clone(),
            ));
        }

        subscription.closed().await;
        info!(rpc = %self.name, "unregistered");
        done.cancel();
    }
}

async fn respond(
    conn: Connection,
    request_id: String,
    invocation: Result<Invocation>,
    handler: Arc<dyn RpcHandler>,
) {
    let result = match invocation {
        Ok(invocation) => {
            let call = tokio::spawn(async move { handler.call(invocation).await });
            match call.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    error!(%request_id, "handler panicked");
                    Err(anyhow!("handler panicked"))
                }
                Err(e) => Err(anyhow!("handler did not complete: {e}")),
            }
        }
        Err(e) => Err(e.into()),
    };
    if let Err(e) = &result {
        warn!(%request_id, error = %format!("{e:#}"), "invocation failed");
    }

    let reply = encode_result(&request_id, result);
    if let Err(e) = conn.send(ClientMessage::new(reply)).await {
        error!(%request_id, error = %e, "failed to send invocation result");
    }
}
