//! Wire message model for the itermctl connection core.
//!
//! The remote application's schema is an external contract; these types
//! model the parts the connection core routes and correlates on, plus the
//! registration and invocation shapes used by server-originated RPCs.

mod id;
mod message;
mod notification;
mod rpc;

pub use id::MessageId;
pub use message::{ClientMessage, ClientRequest, ServerBody, ServerMessage};
pub use notification::{
    Notification, NotificationRequest, NotificationResponse, NotificationStatus,
    NotificationType, Rejection, SubscriptionArguments, ALL_SESSIONS,
};
pub use rpc::{
    ContextMenuAttributes, InvocationContext, InvocationErrorStatus, InvokeFunctionRequest,
    InvokeFunctionResponse, KnobDeclaration, KnobKind, PopoverSize, RoleAttributes, RpcArgument, RpcArgumentDefault,
    RpcArgumentSignature, RpcRegistrationRequest, RpcResult, RpcResultRequest, RpcRole,
    ServerOriginatedRpc, ServerOriginatedRpcNotification, SessionTitleAttributes,
    StatusBarComponentAction, StatusBarComponentAttributes, StatusBarComponentRequest,
    StatusBarComponentResponse, StatusBarComponentStatus,
};
