//! What gets registered: a name, an argument schema and a role

use itermctl_protocol::{
    NotificationRequest, NotificationType, RpcArgumentSignature, RpcRegistrationRequest,
    SubscriptionArguments,
};

use crate::error::{Result, RpcError};
use crate::role::Role;
use crate::schema::{ArgSchema, KNOBS_ARGUMENT};

#[derive(Debug, Clone, PartialEq)]
pub struct RpcDescriptor {
    name: String,
    schema: ArgSchema,
    role: Role,
}

impl RpcDescriptor {
    pub fn new(name: impl Into<String>, schema: ArgSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            role: Role::Generic,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &ArgSchema {
        &self.schema
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(RpcError::UnnamedRpc);
        }
        self.schema.validate()?;
        self.role.validate()
    }

    /// Registration payload. Status-bar components get a trailing `knobs`
    /// argument carrying the user's knob values.
    pub fn registration_request(&self) -> RpcRegistrationRequest {
        let mut arguments = self.schema.signatures();
        if matches!(self.role, Role::StatusBar(_)) {
            arguments.push(RpcArgumentSignature {
                name: KNOBS_ARGUMENT.to_string(),
            });
        }

        RpcRegistrationRequest {
            name: self.name.clone(),
            arguments,
            defaults: self.schema.defaults(),
            role: self.role.rpc_role(),
            role_attributes: self.role.attributes(),
        }
    }

    pub fn notification_request(&self) -> NotificationRequest {
        NotificationRequest::new(true, NotificationType::ServerOriginatedRpc, "").with_arguments(
            SubscriptionArguments::RpcRegistration(self.registration_request()),
        )
    }
}
