//! Server-originated RPC wire shapes
//!
//! Registration travels as the arguments of a
//! [`NotificationRequest`](crate::NotificationRequest); invocations arrive as
//! notifications and results go back as one-way requests.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcArgumentSignature {
    pub name: String,
}

/// Binds an argument to a remote variable used when the caller omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcArgumentDefault {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcRole {
    Generic,
    SessionTitle,
    StatusBarComponent,
    ContextMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnobKind {
    Checkbox,
    String,
    PositiveFloatingPoint,
}

/// A user-configurable setting of a status-bar component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnobDeclaration {
    pub kind: KnobKind,
    pub name: String,
    pub key: String,
    pub placeholder: String,
    pub json_default_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTitleAttributes {
    pub display_name: String,
    pub unique_identifier: String,
}

/// A session context-menu item; invoking it calls the registered function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMenuAttributes {
    pub display_name: String,
    pub unique_identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBarComponentAttributes {
    pub short_description: String,
    pub detailed_description: String,
    pub exemplar: String,
    /// Seconds between refreshes; absent disables periodic updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_cadence: Option<f32>,
    pub unique_identifier: String,
    #[serde(default)]
    pub knobs: Vec<KnobDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleAttributes {
    SessionTitle(SessionTitleAttributes),
    StatusBarComponent(StatusBarComponentAttributes),
    ContextMenu(ContextMenuAttributes),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRegistrationRequest {
    pub name: String,
    pub arguments: Vec<RpcArgumentSignature>,
    #[serde(default)]
    pub defaults: Vec<RpcArgumentDefault>,
    pub role: RpcRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_attributes: Option<RoleAttributes>,
}

/// One argument of an incoming invocation, still JSON-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcArgument {
    pub name: String,
    pub json_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOriginatedRpc {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<RpcArgument>,
}

/// The remote side calling a registered function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOriginatedRpcNotification {
    pub request_id: String,
    pub rpc: ServerOriginatedRpc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcResult {
    JsonValue(String),
    JsonException(String),
}

/// Reply to a [`ServerOriginatedRpcNotification`], correlated by request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResultRequest {
    pub request_id: String,
    pub result: RpcResult,
}

impl RpcResultRequest {
    pub fn value(request_id: impl Into<String>, json_value: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            result: RpcResult::JsonValue(json_value.into()),
        }
    }

    pub fn exception(request_id: impl Into<String>, json_exception: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            result: RpcResult::JsonException(json_exception.into()),
        }
    }
}

/// Scope a remote function invocation runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum InvocationContext {
    App,
    Session(String),
    Tab(String),
    Window(String),
}

/// Local code calling a function on the remote side, e.g.
/// `my_function(arg: "value")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeFunctionRequest {
    pub invocation: String,
    pub context: InvocationContext,
    /// Seconds the remote side waits before failing the invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvocationErrorStatus {
    Timeout,
    Failed,
    RequestMalformed,
    InvalidId,
}

impl std::fmt::Display for InvocationErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Timeout => "TIMEOUT",
            Self::Failed => "FAILED",
            Self::RequestMalformed => "REQUEST_MALFORMED",
            Self::InvalidId => "INVALID_ID",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeFunctionResponse {
    Success {
        json_result: String,
    },
    Error {
        status: InvocationErrorStatus,
        error_reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopoverSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBarComponentAction {
    OpenPopover {
        session_id: String,
        html: String,
        size: PopoverSize,
    },
}

/// Side-channel request issued on behalf of a status-bar component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBarComponentRequest {
    pub identifier: String,
    pub action: StatusBarComponentAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBarComponentStatus {
    Ok,
    SessionNotFound,
    RequestMalformed,
    InvalidIdentifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBarComponentResponse {
    pub status: StatusBarComponentStatus,
}
