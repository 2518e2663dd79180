//! Roles a registered callable can play on the remote side

use itermctl_protocol::{
    ContextMenuAttributes, KnobDeclaration, KnobKind, RoleAttributes, RpcRole,
    SessionTitleAttributes, StatusBarComponentAttributes,
};
use serde_json::Value;

use crate::error::{Result, RpcError};

/// A user-configurable setting of a status-bar component.
#[derive(Debug, Clone, PartialEq)]
pub struct Knob {
    kind: KnobKind,
    name: String,
    key: String,
    placeholder: Option<String>,
    default: KnobDefault,
}

#[derive(Debug, Clone, PartialEq)]
enum KnobDefault {
    Bool(bool),
    String(String),
    Float(f64),
}

impl KnobDefault {
    fn to_json(&self) -> Value {
        match self {
            Self::Bool(v) => Value::Bool(*v),
            Self::String(v) => Value::String(v.clone()),
            Self::Float(v) => Value::from(*v),
        }
    }
}

impl Knob {
    fn new(
        kind: KnobKind,
        name: impl Into<String>,
        key: impl Into<String>,
        default: KnobDefault,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            key: key.into(),
            placeholder: None,
            default,
        }
    }

    pub fn checkbox(name: impl Into<String>, key: impl Into<String>, default: bool) -> Self {
        Self::new(KnobKind::Checkbox, name, key, KnobDefault::Bool(default))
    }

    pub fn string(name: impl Into<String>, key: impl Into<String>, default: &str) -> Self {
        Self::new(
            KnobKind::String,
            name,
            key,
            KnobDefault::String(default.to_string()),
        )
    }

    /// The default must be finite and greater than zero; other values fail
    /// validation when the callable is registered.
    pub fn positive_float(name: impl Into<String>, key: impl Into<String>, default: f64) -> Self {
        Self::new(
            KnobKind::PositiveFloatingPoint,
            name,
            key,
            KnobDefault::Float(default),
        )
    }

    /// Hint text shown in an empty field. Defaults to the knob's name.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(RpcError::UnnamedKnob);
        }
        if let KnobDefault::Float(value) = self.default {
            if !value.is_finite() || value <= 0.0 {
                return Err(RpcError::InvalidKnobDefault {
                    key: self.key.clone(),
                    value,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn declaration(&self) -> KnobDeclaration {
        KnobDeclaration {
            kind: self.kind,
            name: self.name.clone(),
            key: self.key.clone(),
            placeholder: self
                .placeholder
                .clone()
                .unwrap_or_else(|| self.name.clone()),
            json_default_value: self.default.to_json().to_string(),
        }
    }
}

/// Presentation of a callable that renders a status-bar component.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBarComponent {
    pub short_description: String,
    pub description: String,
    pub exemplar: String,
    /// Seconds between refreshes. Zero or less disables periodic updates.
    pub update_cadence: f32,
    pub identifier: String,
    pub knobs: Vec<Knob>,
}

impl StatusBarComponent {
    pub fn new(
        identifier: impl Into<String>,
        short_description: impl Into<String>,
        description: impl Into<String>,
        exemplar: impl Into<String>,
    ) -> Self {
        Self {
            short_description: short_description.into(),
            description: description.into(),
            exemplar: exemplar.into(),
            update_cadence: 0.0,
            identifier: identifier.into(),
            knobs: Vec::new(),
        }
    }

    pub fn update_cadence(mut self, seconds: f32) -> Self {
        self.update_cadence = seconds;
        self
    }

    pub fn knob(mut self, knob: Knob) -> Self {
        self.knobs.push(knob);
        self
    }

    fn attributes(&self) -> StatusBarComponentAttributes {
        StatusBarComponentAttributes {
            short_description: self.short_description.clone(),
            detailed_description: self.description.clone(),
            exemplar: self.exemplar.clone(),
            update_cadence: (self.update_cadence > 0.0).then_some(self.update_cadence),
            unique_identifier: self.identifier.clone(),
            knobs: self.knobs.iter().map(Knob::declaration).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Role {
    /// Callable by name from anywhere an invocation is accepted.
    #[default]
    Generic,
    /// Computes session titles.
    SessionTitle {
        display_name: String,
        identifier: String,
    },
    StatusBar(StatusBarComponent),
    /// Adds an item to the session context menu.
    ContextMenu {
        display_name: String,
        identifier: String,
    },
}

impl Role {
    pub fn session_title(display_name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::SessionTitle {
            display_name: display_name.into(),
            identifier: identifier.into(),
        }
    }

    pub fn context_menu(display_name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::ContextMenu {
            display_name: display_name.into(),
            identifier: identifier.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::StatusBar(component) => component.knobs.iter().try_for_each(Knob::validate),
            _ => Ok(()),
        }
    }

    pub(crate) fn rpc_role(&self) -> RpcRole {
        match self {
            Self::Generic => RpcRole::Generic,
            Self::SessionTitle { .. } => RpcRole::SessionTitle,
            Self::StatusBar(_) => RpcRole::StatusBarComponent,
            Self::ContextMenu { .. } => RpcRole::ContextMenu,
        }
    }

    pub(crate) fn attributes(&self) -> Option<RoleAttributes> {
        match self {
            Self::Generic => None,
            Self::SessionTitle {
                display_name,
                identifier,
            } => Some(RoleAttributes::SessionTitle(SessionTitleAttributes {
                display_name: display_name.clone(),
                unique_identifier: identifier.clone(),
            })),
            Self::StatusBar(component) => {
                Some(RoleAttributes::StatusBarComponent(component.attributes()))
            }
            Self::ContextMenu {
                display_name,
                identifier,
            } => Some(RoleAttributes::ContextMenu(ContextMenuAttributes {
                display_name: display_name.clone(),
                unique_identifier: identifier.clone(),
            })),
        }
    }

    pub(crate) fn status_bar_identifier(&self) -> Option<&str> {
        match self {
            Self::StatusBar(component) => Some(&component.identifier),
            _ => None,
        }
    }
}
