//! Connection configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Tunables for a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// How long a request waits for its response before failing
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
    /// How long a full receiver may hold up a message before it is dropped
    /// for that receiver
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_ms: u64,
    /// Messages buffered per receiver
    #[serde(default = "default_receiver_capacity")]
    pub receiver_capacity: usize,
}

fn default_response_timeout() -> u64 { 5_000 }
fn default_delivery_timeout() -> u64 { 1_000 }
fn default_receiver_capacity() -> usize { 100 }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 5_000,
            delivery_timeout_ms: 1_000,
            receiver_capacity: 100,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.response_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "response_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.delivery_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "delivery_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.receiver_capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "receiver_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}
