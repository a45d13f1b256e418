use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a channel (one input of a multi-input board).
pub type ChannelIndex = u32;

/// Identity of one attached device, usually its serial number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceKey(String);

impl DeviceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for DeviceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<u32> for DeviceKey {
    /// Key from a numeric serial number.
    fn from(serial: u32) -> Self {
        Self(serial.to_string())
    }
}

/// Decoded attribute value.
///
/// Enumerated attributes are always held as their canonical wire code
/// ([`Value::Code`]), never as the alias a caller supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Numeric reading or configuration value. May be NaN when the
    /// controller sent something that did not parse; non-finite numbers
    /// serialize as strings (`"NaN"`, `"inf"`, `"-inf"`).
    Number(#[serde(with = "non_finite")] f64),

    /// Canonical wire code of an enumerated attribute.
    Code(i64),

    /// Free text.
    Text(String),
}

impl Value {
    /// Numeric content, if this is a [`Value::Number`].
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Wire code, if this is a [`Value::Code`].
    #[must_use]
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Self::Code(code) => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this is the not-a-number sentinel left by a malformed update.
    #[must_use]
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Number(n) if n.is_nan())
    }
}

impl fmt::Display for Value {
    /// Wire representation: numbers in shortest form (`2`, `0.5`), codes as
    /// integers, text verbatim.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Code(code) => write!(f, "{code}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// JSON has no NaN or infinity, so those travel as strings.
mod non_finite {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if n.is_finite() {
            serializer.serialize_f64(*n)
        } else {
            serializer.collect_str(n)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(text) => match text.parse::<f64>() {
                Ok(n) if !n.is_finite() => Ok(n),
                _ => Err(D::Error::custom(format!(
                    "expected a number, \"NaN\", \"inf\" or \"-inf\", got \"{text}\""
                ))),
            },
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One or more channel indices addressed by a command.
///
/// Commands accept either a single index or a list; both normalize to an
/// `IndexSet`. Order is preserved.
///
/// ```
/// use phidget_core::IndexSet;
///
/// let single: IndexSet = 2.into();
/// assert_eq!(single.as_slice(), &[2]);
///
/// let many: IndexSet = [0, 1, 3].into();
/// assert_eq!(many.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSet(Vec<ChannelIndex>);

impl IndexSet {
    #[must_use]
    pub fn as_slice(&self) -> &[ChannelIndex] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ChannelIndex> + '_ {
        self.0.iter().copied()
    }
}

impl From<ChannelIndex> for IndexSet {
    fn from(index: ChannelIndex) -> Self {
        Self(vec![index])
    }
}

impl From<Vec<ChannelIndex>> for IndexSet {
    fn from(indices: Vec<ChannelIndex>) -> Self {
        Self(indices)
    }
}

impl From<&[ChannelIndex]> for IndexSet {
    fn from(indices: &[ChannelIndex]) -> Self {
        Self(indices.to_vec())
    }
}

impl<const N: usize> From<[ChannelIndex; N]> for IndexSet {
    fn from(indices: [ChannelIndex; N]) -> Self {
        Self(indices.to_vec())
    }
}

impl FromIterator<ChannelIndex> for IndexSet {
    fn from_iter<I: IntoIterator<Item = ChannelIndex>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Value::Number(2.0), "2")]
    #[case(Value::Number(0.5), "0.5")]
    #[case(Value::Number(-12.25), "-12.25")]
    #[case(Value::Code(3), "3")]
    #[case(Value::Text("1048".to_string()), "1048")]
    fn test_value_wire_format(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Number(23.5).as_number(), Some(23.5));
        assert_eq!(Value::Number(23.5).as_code(), None);
        assert_eq!(Value::Code(1).as_code(), Some(1));
        assert_eq!(Value::from("abc").as_text(), Some("abc"));
        assert!(Value::Number(f64::NAN).is_nan());
        assert!(!Value::Code(0).is_nan());
    }

    #[test]
    fn test_value_serialization() {
        let json = serde_json::to_string(&Value::Code(1)).unwrap();
        assert_eq!(json, r#"{"kind":"code","value":1}"#);

        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Code(1));
    }

    #[rstest]
    #[case(Value::Number(23.5), r#"{"kind":"number","value":23.5}"#)]
    #[case(Value::Number(f64::INFINITY), r#"{"kind":"number","value":"inf"}"#)]
    #[case(Value::Number(f64::NEG_INFINITY), r#"{"kind":"number","value":"-inf"}"#)]
    fn test_number_serialization(#[case] value: Value, #[case] expected: &str) {
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, expected);
        assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), value);
    }

    #[test]
    fn test_nan_sentinel_survives_json() {
        let json = serde_json::to_string(&Value::Number(f64::NAN)).unwrap();
        assert_eq!(json, r#"{"kind":"number","value":"NaN"}"#);

        let back: Value = serde_json::from_str(&json).unwrap();
        assert!(back.is_nan());
    }

    #[rstest]
    #[case(r#"{"kind":"number","value":"warm"}"#)]
    #[case(r#"{"kind":"number","value":"1.5"}"#)]
    #[case(r#"{"kind":"number","value":null}"#)]
    fn test_number_rejects_other_text(#[case] json: &str) {
        assert!(serde_json::from_str::<Value>(json).is_err());
    }

    #[test]
    fn test_device_key() {
        let key = DeviceKey::from(370_123u32);
        assert_eq!(key.as_str(), "370123");
        assert_eq!(key, DeviceKey::from("370123"));
        assert_eq!(format!("{key}"), "370123");
    }

    #[test]
    fn test_index_set_conversions() {
        assert_eq!(IndexSet::from(4).as_slice(), &[4]);
        assert_eq!(IndexSet::from(vec![0, 2]).as_slice(), &[0, 2]);
        assert_eq!(IndexSet::from([3, 1]).iter().collect::<Vec<_>>(), vec![3, 1]);
        assert!(IndexSet::from(Vec::new()).is_empty());

        let collected: IndexSet = (0..3).collect();
        assert_eq!(collected.len(), 3);
    }
}
