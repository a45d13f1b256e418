//! Inbound update and outbound command messages.
//!
//! # Parameter Keys
//!
//! A parameter is addressed by its keyword, plus a channel index for
//! channel-indexed keywords:
//!
//! ```text
//! AmbientTemperature            device-wide parameter
//! TemperatureChangeTrigger/2    parameter of channel 2
//! ```
//!
//! The transport prefixes keys with whatever routing its wire format needs.
//!
//! ```
//! use phidget_protocol::{ParameterKey, UpdateMessage};
//!
//! let key: ParameterKey = "Temperature/2".parse().unwrap();
//! assert_eq!(key.keyword(), "Temperature");
//! assert_eq!(key.index(), Some(2));
//!
//! let update = UpdateMessage::from_key_value("Temperature/2", "101.2").unwrap();
//! assert_eq!(update.index, Some(2));
//! assert_eq!(update.value, "101.2");
//! ```

use phidget_core::{ChannelIndex, Error, Result, Value, constants::KEY_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address of a device parameter: keyword and optional channel index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterKey {
    keyword: String,
    index: Option<ChannelIndex>,
}

impl ParameterKey {
    /// Key of a device-wide parameter.
    pub fn scalar(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            index: None,
        }
    }

    /// Key of a channel parameter.
    pub fn indexed(keyword: impl Into<String>, index: ChannelIndex) -> Self {
        Self {
            keyword: keyword.into(),
            index: Some(index),
        }
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn index(&self) -> Option<ChannelIndex> {
        self.index
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}{}{}", self.keyword, KEY_SEPARATOR, index),
            None => f.write_str(&self.keyword),
        }
    }
}

impl FromStr for ParameterKey {
    type Err = Error;

    /// Parse `Keyword` or `Keyword/index`.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameterKey` if the keyword is empty or the
    /// index is not a non-negative integer.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (keyword, index) = match s.split_once(KEY_SEPARATOR) {
            Some((keyword, index)) => {
                let index = index.trim().parse::<ChannelIndex>().map_err(|_| {
                    Error::InvalidParameterKey(format!("invalid channel index in '{s}'"))
                })?;
                (keyword.trim(), Some(index))
            }
            None => (s, None),
        };

        if keyword.is_empty() {
            return Err(Error::InvalidParameterKey(format!("missing keyword in '{s}'")));
        }

        Ok(Self {
            keyword: keyword.to_string(),
            index,
        })
    }
}

/// One inbound state update as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMessage {
    pub keyword: String,
    pub index: Option<ChannelIndex>,
    /// Raw, undecoded value.
    pub value: String,
}

impl UpdateMessage {
    pub fn new(
        keyword: impl Into<String>,
        index: Option<ChannelIndex>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            index,
            value: value.into(),
        }
    }

    /// Update of a device-wide keyword.
    pub fn scalar(keyword: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(keyword, None, value)
    }

    /// Update of a channel keyword.
    pub fn indexed(
        keyword: impl Into<String>,
        index: ChannelIndex,
        value: impl Into<String>,
    ) -> Self {
        Self::new(keyword, Some(index), value)
    }

    /// Build an update from a parameter key and its raw value.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameterKey` if the key does not parse.
    pub fn from_key_value(key: &str, value: impl Into<String>) -> Result<Self> {
        let key: ParameterKey = key.parse()?;
        Ok(Self::new(key.keyword, key.index, value))
    }

    #[must_use]
    pub fn key(&self) -> ParameterKey {
        ParameterKey {
            keyword: self.keyword.clone(),
            index: self.index,
        }
    }
}

impl fmt::Display for UpdateMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value)
    }
}

/// Parameter-set request handed to the transport.
///
/// Commands are fire-and-forget: the transport owns framing, delivery and
/// acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCommand {
    pub key: ParameterKey,

    /// Encoded value.
    pub value: String,

    /// Whether the controller should keep the value for later sessions.
    pub persistent: bool,
}

impl OutboundCommand {
    /// Persistent command setting `key` to `value`.
    #[must_use]
    pub fn set(key: ParameterKey, value: &Value) -> Self {
        Self {
            key,
            value: value.to_string(),
            persistent: true,
        }
    }

    /// Mark the command as transient.
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }
}

impl fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
