//! A single call from the remote side into a registered callable

use std::collections::HashMap;

use itermctl_client::protocol::{
    ClientMessage, PopoverSize, ServerOriginatedRpcNotification, StatusBarComponentAction,
    StatusBarComponentRequest,
};
use itermctl_client::Connection;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, RpcError};
use crate::schema::{ArgSchema, Arguments, KNOBS_ARGUMENT};

/// Lets a status-bar invocation act on its component.
#[derive(Clone)]
pub(crate) struct StatusBarContext {
    pub(crate) conn: Connection,
    pub(crate) identifier: String,
}

/// Arguments and context of one invocation.
///
/// Declared arguments are decoded up front; [`Invocation::get`] and
/// [`Invocation::knobs`] decode raw values on demand into any type.
pub struct Invocation {
    request_id: String,
    name: String,
    raw: HashMap<String, String>,
    arguments: Arguments,
    status_bar: Option<StatusBarContext>,
}

impl Invocation {
    pub(crate) fn decode(
        notification: &ServerOriginatedRpcNotification,
        schema: &ArgSchema,
        status_bar: Option<StatusBarContext>,
    ) -> Result<Self> {
        let raw: HashMap<String, String> = notification
            .rpc
            .arguments
            .iter()
            .map(|arg| (arg.name.clone(), arg.json_value.clone()))
            .collect();
        let arguments = schema.decode(&raw)?;

        Ok(Self {
            request_id: notification.request_id.clone(),
            name: notification.rpc.name.clone(),
            raw,
            arguments,
            status_bar,
        })
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments decoded against the registered schema.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// The JSON-encoded value of `name` as sent by the caller.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.raw.get(name).map(String::as_str)
    }

    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let json = self
            .raw(name)
            .ok_or_else(|| RpcError::MissingArgument(name.to_string()))?;
        serde_json::from_str(json).map_err(|source| RpcError::Decode {
            name: name.to_string(),
            source,
        })
    }

    /// Decode the status-bar knob values.
    ///
    /// Knobs arrive as a JSON string whose content is itself the JSON object
    /// of knob values keyed by knob key.
    pub fn knobs<T: DeserializeOwned>(&self) -> Result<T> {
        let json = self.raw(KNOBS_ARGUMENT).ok_or(RpcError::NoKnobsArgument)?;
        let inner: String = serde_json::from_str(json).map_err(RpcError::Knobs)?;
        serde_json::from_str(&inner).map_err(RpcError::Knobs)
    }

    /// Show `html` in a popover anchored to the component in `session_id`.
    ///
    /// The request is fire-and-forget: it fails only if it cannot be sent.
    pub async fn open_popover(
        &self,
        session_id: impl Into<String>,
        html: impl Into<String>,
        size: PopoverSize,
    ) -> Result<()> {
        let context = self.status_bar.as_ref().ok_or(RpcError::NotAStatusBar)?;
        let request = StatusBarComponentRequest {
            identifier: context.identifier.clone(),
            action: StatusBarComponentAction::OpenPopover {
                session_id: session_id.into(),
                html: html.into(),
                size,
            },
        };

        let id = context.conn.send(ClientMessage::new(request)).await?;
        debug!(%id, component = %context.identifier, "popover requested");
        Ok(())
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("request_id", &self.request_id)
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("status_bar", &self.status_bar.as_ref().map(|c| &c.identifier))
            .finish()
    }
}
