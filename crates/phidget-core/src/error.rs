//! Error types for device synchronization.
//!
//! Inbound data problems are never surfaced here: unknown keywords and
//! malformed values are absorbed by the state store. These errors cover
//! outbound commands, addressing and configuration.

use thiserror::Error;

/// Result type alias for device synchronization operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Command errors
    /// Command input is outside the accepted domain.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Keyword is not present in the device's registry.
    #[error("Unknown keyword: {0}")]
    UnknownKeyword(String),

    /// Keyword exists but does not accept the requested command.
    #[error("Keyword {keyword} does not accept {command} commands")]
    NotWritable { keyword: String, command: String },

    // Addressing errors
    #[error("Invalid parameter key: {0}")]
    InvalidParameterKey(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device already registered: {0}")]
    DuplicateDevice(String),

    /// The owning task of a device has stopped.
    #[error("Device channel closed: {device}")]
    ChannelClosed { device: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-writable error.
    pub fn not_writable(keyword: impl Into<String>, command: impl Into<String>) -> Self {
        Self::NotWritable {
            keyword: keyword.into(),
            command: command.into(),
        }
    }

    /// Create a new channel-closed error.
    pub fn channel_closed(device: impl Into<String>) -> Self {
        Self::ChannelClosed {
            device: device.into(),
        }
    }

    /// Whether this error was raised by command input validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
