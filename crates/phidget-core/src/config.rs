//! Device and manager configuration.
//!
//! Both structs deserialize from JSON with every field optional; missing
//! fields fall back to [`Default`].
//!
//! ```
//! use phidget_core::{DeviceConfig, InboundPolicy};
//!
//! let config = DeviceConfig::from_json_str(r#"{ "name": "oven", "inbound_policy": "strict" }"#)
//!     .unwrap();
//! assert_eq!(config.name, "oven");
//! assert_eq!(config.inbound_policy, InboundPolicy::Strict);
//! ```

use crate::{
    Error, Result,
    constants::{DEFAULT_DEVICE_NAME, DEFAULT_OUTBOUND_CAPACITY, DEFAULT_REQUEST_CAPACITY},
};
use serde::{Deserialize, Serialize};

/// How the state store treats inbound values that fail to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundPolicy {
    /// Store a not-a-number sentinel and carry on, emitting as usual.
    #[default]
    Permissive,

    /// Drop the update: no mutation, no event.
    Strict,
}

/// Configuration for a single device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name used in log output.
    pub name: String,

    /// Treatment of malformed inbound values.
    pub inbound_policy: InboundPolicy,

    /// Capacity of the device actor's request queue.
    pub request_capacity: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEVICE_NAME.to_string(),
            inbound_policy: InboundPolicy::default(),
            request_capacity: DEFAULT_REQUEST_CAPACITY,
        }
    }
}

impl DeviceConfig {
    /// Create a default configuration with the given device name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the inbound policy.
    pub fn with_inbound_policy(mut self, policy: InboundPolicy) -> Self {
        self.inbound_policy = policy;
        self
    }

    /// Parse and validate a configuration from JSON.
    ///
    /// # Errors
    /// Returns `Error::Json` for malformed JSON and `Error::Config` when a
    /// value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns `Error::Config` if the name is empty or the request capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("device name must not be empty".to_string()));
        }
        if self.request_capacity == 0 {
            return Err(Error::Config(
                "request_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a multi-device manager.
///
/// The aggregated event stream is unbounded, so only the outbound side has a
/// capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Capacity of the outbound command queue handed to the transport.
    pub outbound_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

impl ManagerConfig {
    /// Parse and validate a configuration from JSON.
    ///
    /// # Errors
    /// Returns `Error::Json` for malformed JSON and `Error::Config` when the
    /// outbound capacity is zero.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `Error::Config` if the outbound capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.outbound_capacity == 0 {
            return Err(Error::Config(
                "outbound capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
