//! Server-originated RPCs for the iTerm2 API
//!
//! Register a local callable under a name, with a declared argument schema
//! and a role (generic function, session title provider or status-bar
//! component). The remote side then invokes it by name; each invocation runs
//! on its own task and its result is sent back correlated by request id.
//!
//! ```ignore
//! let descriptor = RpcDescriptor::new(
//!     "greet",
//!     ArgSchema::new().arg(ArgSpec::string("who").default_from("session.name")),
//! );
//! let registration = register(&conn, descriptor, handler_fn(|inv: Invocation| async move {
//!     let who: String = inv.get("who")?;
//!     Ok(serde_json::json!(format!("hello {who}")))
//! }))
//! .await?;
//! ```

mod descriptor;
mod error;
mod handler;
mod invocation;
mod registration;
mod role;
mod schema;

pub use descriptor::RpcDescriptor;
pub use error::{Result, RpcError};
pub use handler::{handler_fn, HandlerFn, RpcHandler};
pub use invocation::Invocation;
pub use registration::{register, register_scoped, Registration};
pub use role::{Knob, Role, StatusBarComponent};
pub use schema::{ArgSchema, ArgSpec, ArgType, ArgValue, Arguments, KNOBS_ARGUMENT};
