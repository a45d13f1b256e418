//! Thermocouple types.
//!
//! | Type | Wire code | Accepted spellings |
//! |------|-----------|--------------------|
//! | J    | 0         | `J`, `TYPE_J`      |
//! | K    | 1         | `K`, `TYPE_K`      |
//! | E    | 2         | `E`, `TYPE_E`      |
//! | T    | 3         | `T`, `TYPE_T`      |
//!
//! Spellings are case-insensitive.

use phidget_core::{Error, Result};
use phidget_protocol::{EnumEntry, EnumInput, EnumTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire codes of the supported thermocouple types.
pub static THERMOCOUPLE_TYPES: EnumTable = EnumTable::new(
    "thermocouple type",
    &[
        EnumEntry::new("J", 0, &["TYPE_J"]),
        EnumEntry::new("K", 1, &["TYPE_K"]),
        EnumEntry::new("E", 2, &["TYPE_E"]),
        EnumEntry::new("T", 3, &["TYPE_T"]),
    ],
);

/// Thermocouple type configured on an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThermocoupleType {
    J,
    K,
    E,
    T,
}

impl ThermocoupleType {
    pub const ALL: [Self; 4] = [Self::J, Self::K, Self::E, Self::T];

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::J => 0,
            Self::K => 1,
            Self::E => 2,
            Self::T => 3,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::J => "J",
            Self::K => "K",
            Self::E => "E",
            Self::T => "T",
        }
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl fmt::Display for ThermocoupleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ThermocoupleType {
    type Err = Error;

    /// Parse `"k"`, `"TYPE_K"` and friends.
    fn from_str(s: &str) -> Result<Self> {
        let code = THERMOCOUPLE_TYPES.resolve(&EnumInput::from(s))?;
        Self::try_from(code)
    }
}

impl TryFrom<i64> for ThermocoupleType {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        Self::from_code(code)
            .ok_or_else(|| Error::validation(format!("Unsupported thermocouple type code: {code}")))
    }
}

impl From<ThermocoupleType> for EnumInput {
    fn from(kind: ThermocoupleType) -> Self {
        EnumInput::Code(kind.code())
    }
}
