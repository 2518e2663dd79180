//! Request/response correlation
//!
//! A request registers a receiver filtered on its message id *before* the
//! request is written, so the response cannot race past it. The receiver is
//! deregistered as soon as the request finishes, whatever the outcome.

use std::sync::Arc;
use std::time::Duration;

use itermctl_protocol::{
    ClientMessage, InvocationContext, InvokeFunctionRequest, InvokeFunctionResponse, MessageId,
    ServerMessage,
};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::receiver::accept_message_id;

/// Per-request overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Overrides [`ClientConfig::response_timeout_ms`](crate::ClientConfig).
    pub timeout: Option<Duration>,
    /// Abandons the wait when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl Connection {
    /// Send `message` and wait for the response carrying the same id.
    pub async fn request(&self, message: ClientMessage) -> Result<Arc<ServerMessage>> {
        self.request_with(message, RequestOptions::default()).await
    }

    pub async fn request_with(
        &self,
        mut message: ClientMessage,
        options: RequestOptions,
    ) -> Result<Arc<ServerMessage>> {
        let id = match message.id {
            Some(id) => id,
            None => {
                let id = MessageId::next().ok_or(ClientError::NoMessageId)?;
                message.id = Some(id);
                id
            }
        };

        let mut receiver =
            self.add_receiver(format!("response to {id}"), accept_message_id(id))?;
        self.send(message).await?;

        let timeout = options
            .timeout
            .unwrap_or_else(|| self.config().response_timeout());
        let cancel = options.cancel.unwrap_or_default();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled { id }),
            response = receiver.recv() => response.ok_or(ClientError::Closed),
            _ = tokio::time::sleep(timeout) => Err(ClientError::Timeout { id, timeout }),
        };
        receiver.deregister();

        let response = outcome?;
        if let Some(reason) = response.error() {
            debug!(message_id = %id, reason, "request failed remotely");
            return Err(ClientError::Server {
                id,
                reason: reason.to_string(),
            });
        }
        Ok(response)
    }

    /// Invoke a function on the remote side at application scope and decode
    /// its JSON result, e.g. `conn.invoke_function::<String>("iterm2.get_string(title: \"x\")")`.
    pub async fn invoke_function<T: DeserializeOwned>(
        &self,
        invocation: impl Into<String>,
    ) -> Result<T> {
        self.invoke_function_in(invocation, InvocationContext::App)
            .await
    }

    /// Invoke a function in a specific session, tab or window.
    pub async fn invoke_function_in<T: DeserializeOwned>(
        &self,
        invocation: impl Into<String>,
        context: InvocationContext,
    ) -> Result<T> {
        let request = InvokeFunctionRequest {
            invocation: invocation.into(),
            context,
            timeout: None,
        };
        let id = MessageId::next().ok_or(ClientError::NoMessageId)?;
        let response = self.request(ClientMessage::new(request).with_id(id)).await?;

        match response.invoke_function_response() {
            Some(InvokeFunctionResponse::Success { json_result }) => {
                Ok(serde_json::from_str(json_result)?)
            }
            Some(InvokeFunctionResponse::Error {
                status,
                error_reason,
            }) => Err(ClientError::Invocation {
                status: *status,
                reason: error_reason.clone(),
            }),
            None => Err(unexpected(id, &response, "invoke_function_response")),
        }
    }
}

pub(crate) fn unexpected(
    id: MessageId,
    response: &ServerMessage,
    expected: &'static str,
) -> ClientError {
    ClientError::UnexpectedResponse {
        id,
        expected,
        actual: response.kind(),
    }
}
