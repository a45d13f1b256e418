//! Inbound value decoding.
//!
//! Decoding never fails outright. A value that does not fit its rule comes
//! back as [`Decoded::Malformed`] carrying the sentinel the state store would
//! keep under the permissive policy.

use crate::registry::DecodeRule;
use phidget_core::Value;

/// Result of decoding one raw inbound value.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Valid(Value),

    /// The raw value did not fit the rule. Always holds the not-a-number
    /// sentinel, so an enumerated field never keeps a non-canonical code.
    Malformed(Value),
}

impl Decoded {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The decoded value or the sentinel.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Valid(value) | Self::Malformed(value) => value,
        }
    }
}

/// Parse a controller number. Surrounding whitespace is ignored; empty input
/// and textual NaN are rejected.
///
/// ```
/// use phidget_protocol::parse_number;
///
/// assert_eq!(parse_number(" 23.5 "), Some(23.5));
/// assert_eq!(parse_number("-1e3"), Some(-1000.0));
/// assert_eq!(parse_number(""), None);
/// assert_eq!(parse_number("warm"), None);
/// ```
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Decode a raw value according to `rule`.
///
/// ```
/// use phidget_core::Value;
/// use phidget_protocol::{DecodeRule, Decoded, decode_value};
///
/// assert_eq!(decode_value(DecodeRule::Number, "101.2"), Decoded::Valid(Value::Number(101.2)));
/// assert!(decode_value(DecodeRule::Number, "n/a").into_value().is_nan());
/// ```
#[must_use]
pub fn decode_value(rule: DecodeRule, raw: &str) -> Decoded {
    match rule {
        DecodeRule::Number => match parse_number(raw) {
            Some(n) => Decoded::Valid(Value::Number(n)),
            None => Decoded::Malformed(Value::Number(f64::NAN)),
        },
        DecodeRule::Enum(table) => match parse_number(raw) {
            Some(n) if n.fract() == 0.0 && table.contains_code(n as i64) => {
                Decoded::Valid(Value::Code(n as i64))
            }
            _ => Decoded::Malformed(Value::Number(f64::NAN)),
        },
        DecodeRule::Text => Decoded::Valid(Value::Text(raw.to_string())),
    }
}
