//! Declarative argument schemas
//!
//! A schema lists a callable's arguments in order, each with a value type and
//! optionally a remote variable the caller's value defaults to. Invocation
//! arguments arrive JSON-encoded and are decoded against the schema.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use itermctl_protocol::{RpcArgumentDefault, RpcArgumentSignature};

use crate::error::{Result, RpcError};

/// Argument name reserved for status-bar knob values.
pub const KNOBS_ARGUMENT: &str = "knobs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Bool,
    String,
    Float,
}

impl ArgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Float => "float64",
        }
    }

    fn zero(&self) -> ArgValue {
        match self {
            Self::Bool => ArgValue::Bool(false),
            Self::String => ArgValue::String(String::new()),
            Self::Float => ArgValue::Float(0.0),
        }
    }

    fn decode(&self, name: &str, json: &str) -> Result<ArgValue> {
        let decode_err = |source| RpcError::Decode {
            name: name.to_string(),
            source,
        };
        let value = match self {
            Self::Bool => ArgValue::Bool(serde_json::from_str(json).map_err(decode_err)?),
            Self::String => ArgValue::String(serde_json::from_str(json).map_err(decode_err)?),
            Self::Float => ArgValue::Float(serde_json::from_str(json).map_err(decode_err)?),
        };
        Ok(value)
    }
}

impl FromStr for ArgType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "float64" => Ok(Self::Float),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for ArgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DeclaredType {
    Known(ArgType),
    Unknown(String),
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    name: String,
    ty: DeclaredType,
    default_path: Option<String>,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>, ty: ArgType) -> Self {
        Self {
            name: name.into(),
            ty: DeclaredType::Known(ty),
            default_path: None,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ArgType::Bool)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ArgType::String)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ArgType::Float)
    }

    /// Declare an argument by type name (`bool`, `string` or `float64`).
    /// Other names fail validation when the callable is registered.
    pub fn named_type(name: impl Into<String>, type_name: &str) -> Self {
        let ty = match type_name.parse::<ArgType>() {
            Ok(ty) => DeclaredType::Known(ty),
            Err(unknown) => DeclaredType::Unknown(unknown),
        };
        Self {
            name: name.into(),
            ty,
            default_path: None,
        }
    }

    /// Bind the argument to a remote variable, e.g. `session.name`, used when
    /// the caller omits it.
    pub fn default_from(mut self, path: impl Into<String>) -> Self {
        self.default_path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg_type(&self) -> Option<ArgType> {
        match &self.ty {
            DeclaredType::Known(ty) => Some(*ty),
            DeclaredType::Unknown(_) => None,
        }
    }
}

/// Ordered argument list of a callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgSchema {
    args: Vec<ArgSpec>,
}

impl ArgSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, spec: ArgSpec) -> Self {
        self.args.push(spec);
        self
    }

    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.args {
            if spec.name.is_empty() {
                return Err(RpcError::UnnamedArgument);
            }
            if spec.name == KNOBS_ARGUMENT {
                return Err(RpcError::ReservedArgument(spec.name.clone()));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(RpcError::DuplicateArgument(spec.name.clone()));
            }
            if let DeclaredType::Unknown(type_name) = &spec.ty {
                return Err(RpcError::UnsupportedType {
                    name: spec.name.clone(),
                    type_name: type_name.clone(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn signatures(&self) -> Vec<RpcArgumentSignature> {
        self.args
            .iter()
            .map(|spec| RpcArgumentSignature {
                name: spec.name.clone(),
            })
            .collect()
    }

    pub(crate) fn defaults(&self) -> Vec<RpcArgumentDefault> {
        self.args
            .iter()
            .filter_map(|spec| {
                spec.default_path.as_ref().map(|path| RpcArgumentDefault {
                    name: spec.name.clone(),
                    path: path.clone(),
                })
            })
            .collect()
    }

    /// Decode raw JSON-encoded arguments. Keys the schema does not declare
    /// are ignored; declared arguments that are absent take their zero value.
    pub fn decode(&self, raw: &HashMap<String, String>) -> Result<Arguments> {
        let mut values = HashMap::with_capacity(self.args.len());
        for spec in &self.args {
            let DeclaredType::Known(ty) = &spec.ty else {
                continue;
            };
            let value = match raw.get(&spec.name) {
                Some(json) => ty.decode(&spec.name, json)?,
                None => ty.zero(),
            };
            values.insert(spec.name.clone(), value);
        }
        Ok(Arguments { values })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Bool(bool),
    String(String),
    Float(f64),
}

/// Decoded arguments of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<String, ArgValue>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(v)) => Some(v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ArgValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
