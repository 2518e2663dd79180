//! Handler trait and result encoding

use std::future::Future;

use async_trait::async_trait;
use itermctl_client::protocol::RpcResultRequest;
use serde_json::{json, Value};

use crate::invocation::Invocation;

/// Local code run when the remote side invokes a registered callable.
///
/// `Ok` values are returned to the caller as JSON; errors are returned as an
/// exception carrying the error's display text.
#[async_trait]
pub trait RpcHandler: Send + Sync + 'static {
    async fn call(&self, invocation: Invocation) -> anyhow::Result<Value>;
}

/// Adapts an async closure into an [`RpcHandler`].
pub struct HandlerFn<F>(F);

pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> RpcHandler for HandlerFn<F>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn call(&self, invocation: Invocation) -> anyhow::Result<Value> {
        (self.0)(invocation).await
    }
}

pub(crate) fn encode_result(request_id: &str, result: anyhow::Result<Value>) -> RpcResultRequest {
    match result {
        Ok(value) => RpcResultRequest::value(request_id, value.to_string()),
        Err(err) => {
            let exception = json!({ "reason": format!("{err:#}") });
            RpcResultRequest::exception(request_id, exception.to_string())
        }
    }
}
