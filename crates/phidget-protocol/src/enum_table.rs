//! Enumerated attribute tables.
//!
//! An [`EnumTable`] is an immutable, process-wide mapping between symbols and
//! integer wire codes. Lookups go both ways: alias → code when normalizing a
//! command, code → symbol when validating one.
//!
//! ```
//! use phidget_protocol::{EnumEntry, EnumInput, EnumTable};
//!
//! static MODES: EnumTable = EnumTable::new(
//!     "mode",
//!     &[
//!         EnumEntry::new("SLOW", 0, &["S"]),
//!         EnumEntry::new("FAST", 1, &["F"]),
//!     ],
//! );
//!
//! assert_eq!(MODES.resolve(&EnumInput::from("fast")).unwrap(), 1);
//! assert_eq!(MODES.resolve(&EnumInput::from("s")).unwrap(), 0);
//! assert_eq!(MODES.resolve(&EnumInput::from(1)).unwrap(), 1);
//! assert!(MODES.resolve(&EnumInput::from(7)).is_err());
//! ```

use phidget_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One symbol of an enumerated attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumEntry {
    /// Canonical symbol, e.g. `"K"`.
    pub symbol: &'static str,

    /// Integer code sent on the wire.
    pub code: i64,

    /// Additional case-insensitive spellings accepted from callers.
    pub aliases: &'static [&'static str],
}

impl EnumEntry {
    pub const fn new(symbol: &'static str, code: i64, aliases: &'static [&'static str]) -> Self {
        Self {
            symbol,
            code,
            aliases,
        }
    }

    fn matches(&self, alias: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(alias)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias))
    }
}

/// Closed set of enumerated wire codes.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumTable {
    name: &'static str,
    entries: &'static [EnumEntry],
}

impl EnumTable {
    pub const fn new(name: &'static str, entries: &'static [EnumEntry]) -> Self {
        Self { name, entries }
    }

    /// Human readable name used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn entries(&self) -> &'static [EnumEntry] {
        self.entries
    }

    /// Look up the wire code for a case-insensitive symbol or alias.
    #[must_use]
    pub fn code_for_alias(&self, alias: &str) -> Option<i64> {
        let alias = alias.trim();
        self.entries
            .iter()
            .find(|entry| entry.matches(alias))
            .map(|entry| entry.code)
    }

    /// Reverse lookup from wire code to canonical symbol.
    #[must_use]
    pub fn symbol_for_code(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.symbol)
    }

    #[must_use]
    pub fn contains_code(&self, code: i64) -> bool {
        self.symbol_for_code(code).is_some()
    }

    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|entry| entry.code)
    }

    /// Normalize caller input to a canonical wire code.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the alias is unknown or the code is not
    /// part of the table.
    pub fn resolve(&self, input: &EnumInput) -> Result<i64> {
        match input {
            EnumInput::Alias(alias) => self.code_for_alias(alias).ok_or_else(|| {
                Error::validation(format!("Unsupported {}: {}", self.name, alias))
            }),
            EnumInput::Code(code) if self.contains_code(*code) => Ok(*code),
            EnumInput::Code(code) => Err(Error::validation(format!(
                "{} must be one of {:?}, got {}",
                self.name,
                self.codes().collect::<Vec<_>>(),
                code
            ))),
        }
    }
}

/// Caller-supplied value for an enumerated attribute: an alias or a raw code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumInput {
    Code(i64),
    Alias(String),
}

impl fmt::Display for EnumInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Alias(alias) => f.write_str(alias),
        }
    }
}

impl From<&str> for EnumInput {
    fn from(alias: &str) -> Self {
        Self::Alias(alias.to_string())
    }
}

impl From<String> for EnumInput {
    fn from(alias: String) -> Self {
        Self::Alias(alias)
    }
}

impl From<char> for EnumInput {
    fn from(alias: char) -> Self {
        Self::Alias(alias.to_string())
    }
}

impl From<i64> for EnumInput {
    fn from(code: i64) -> Self {
        Self::Code(code)
    }
}

impl From<i32> for EnumInput {
    fn from(code: i32) -> Self {
        Self::Code(i64::from(code))
    }
}

impl From<u8> for EnumInput {
    fn from(code: u8) -> Self {
        Self::Code(i64::from(code))
    }
}
