//! Keyword registry.
//!
//! Each device type declares one static [`KeywordRegistry`] listing the
//! keywords its controller reports. A [`KeywordDescriptor`] answers four
//! questions about a keyword:
//!
//! | Question | Accessor |
//! |----------|----------|
//! | Which field does it write? | [`KeywordDescriptor::field`] |
//! | Does it carry a channel index? | [`KeywordDescriptor::is_indexed`] |
//! | Is it published as an event? | [`KeywordDescriptor::is_emittable`] |
//! | How is the value decoded? | [`KeywordDescriptor::decode`] |
//!
//! Keywords missing from the registry resolve to `None`; the state store
//! drops them so that newer controller firmware does not break older clients.
//!
//! # Example
//!
//! ```
//! use phidget_protocol::{CommandRule, KeywordDescriptor, KeywordRegistry};
//!
//! static KEYWORDS: [KeywordDescriptor; 3] = [
//!     KeywordDescriptor::scalar("Humidity", "humidity").emittable(),
//!     KeywordDescriptor::channel("Sensor", "sensor").emittable(),
//!     KeywordDescriptor::channel("SensorChangeTrigger", "sensorChangeTrigger")
//!         .command(CommandRule::ChangeTrigger),
//! ];
//! static REGISTRY: KeywordRegistry = KeywordRegistry::new("Example", &KEYWORDS);
//!
//! let sensor = REGISTRY.lookup("Sensor").unwrap();
//! assert!(sensor.is_indexed());
//! assert!(sensor.is_emittable());
//! assert!(REGISTRY.lookup("Firmware2025Keyword").is_none());
//! ```

use crate::enum_table::EnumTable;
use std::fmt;

/// How a raw inbound value is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    Number,
    Enum(&'static EnumTable),
    Text,
}

/// Which outbound set-command a keyword accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandRule {
    /// Non-negative finite threshold.
    ChangeTrigger,

    /// Alias or code resolved through the descriptor's enum table.
    Enumerated,
}

impl fmt::Display for CommandRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeTrigger => write!(f, "change trigger"),
            Self::Enumerated => write!(f, "enumerated"),
        }
    }
}

/// Static description of one protocol keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordDescriptor {
    keyword: &'static str,
    field: &'static str,
    indexed: bool,
    emittable: bool,
    decode: DecodeRule,
    command: Option<CommandRule>,
}

impl KeywordDescriptor {
    /// Device-wide numeric keyword, silent by default.
    pub const fn scalar(keyword: &'static str, field: &'static str) -> Self {
        Self {
            keyword,
            field,
            indexed: false,
            emittable: false,
            decode: DecodeRule::Number,
            command: None,
        }
    }

    /// Channel-indexed numeric keyword, silent by default.
    pub const fn channel(keyword: &'static str, field: &'static str) -> Self {
        Self {
            indexed: true,
            ..Self::scalar(keyword, field)
        }
    }

    /// Publish updates of this keyword as events.
    pub const fn emittable(self) -> Self {
        Self {
            emittable: true,
            ..self
        }
    }

    pub const fn decode_as(self, decode: DecodeRule) -> Self {
        Self { decode, ..self }
    }

    /// Accept outbound set-commands of the given kind.
    pub const fn command(self, rule: CommandRule) -> Self {
        Self {
            command: Some(rule),
            ..self
        }
    }

    /// Wire keyword, e.g. `"TemperatureChangeTrigger"`.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    /// camelCase field and event name, e.g. `"temperatureChangeTrigger"`.
    #[must_use]
    pub fn field(&self) -> &'static str {
        self.field
    }

    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    #[must_use]
    pub fn is_emittable(&self) -> bool {
        self.emittable
    }

    #[must_use]
    pub fn decode(&self) -> DecodeRule {
        self.decode
    }

    #[must_use]
    pub fn command_rule(&self) -> Option<CommandRule> {
        self.command
    }

    /// Enum table when the keyword decodes as an enumeration.
    #[must_use]
    pub fn enum_table(&self) -> Option<&'static EnumTable> {
        match self.decode {
            DecodeRule::Enum(table) => Some(table),
            _ => None,
        }
    }
}

/// Static keyword table for one device type.
#[derive(Debug)]
pub struct KeywordRegistry {
    device_class: &'static str,
    descriptors: &'static [KeywordDescriptor],
    count_keyword: Option<&'static str>,
}

impl KeywordRegistry {
    pub const fn new(
        device_class: &'static str,
        descriptors: &'static [KeywordDescriptor],
    ) -> Self {
        Self {
            device_class,
            descriptors,
            count_keyword: None,
        }
    }

    /// Name the scalar keyword whose value is the device's channel count.
    pub const fn with_count_keyword(self, keyword: &'static str) -> Self {
        Self {
            count_keyword: Some(keyword),
            ..self
        }
    }

    /// Device class name, e.g. `"PhidgetTemperatureSensor"`.
    #[must_use]
    pub fn device_class(&self) -> &'static str {
        self.device_class
    }

    /// Resolve a wire keyword. Matching is exact.
    #[must_use]
    pub fn lookup(&self, keyword: &str) -> Option<&'static KeywordDescriptor> {
        self.descriptors.iter().find(|d| d.keyword == keyword)
    }

    #[must_use]
    pub fn is_count_keyword(&self, keyword: &str) -> bool {
        self.count_keyword == Some(keyword)
    }

    #[must_use]
    pub fn count_keyword(&self) -> Option<&'static str> {
        self.count_keyword
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static KeywordDescriptor> {
        self.descriptors.iter()
    }

    /// Keywords whose updates are published as events.
    pub fn emittable(&self) -> impl Iterator<Item = &'static KeywordDescriptor> {
        self.descriptors.iter().filter(|d| d.emittable)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Check the table for internal consistency.
    ///
    /// Returns a description of every problem found: field names that are not
    /// the camelCase form of their keyword, duplicate keywords, enumerated
    /// commands on keywords without an enum table, and a count keyword that is
    /// missing or channel-indexed.
    #[must_use]
    pub fn inconsistencies(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (i, descriptor) in self.descriptors.iter().enumerate() {
            if descriptor.field != camel_case(descriptor.keyword) {
                problems.push(format!(
                    "{}: field {} is not the camelCase keyword",
                    descriptor.keyword, descriptor.field
                ));
            }
            if self.descriptors[..i]
                .iter()
                .any(|d| d.keyword == descriptor.keyword)
            {
                problems.push(format!("{}: duplicate keyword", descriptor.keyword));
            }
            if descriptor.command == Some(CommandRule::Enumerated)
                && descriptor.enum_table().is_none()
            {
                problems.push(format!(
                    "{}: enumerated command without enum table",
                    descriptor.keyword
                ));
            }
        }

        if let Some(count) = self.count_keyword {
            match self.lookup(count) {
                None => problems.push(format!("{count}: count keyword not registered")),
                Some(d) if d.indexed => {
                    problems.push(format!("{count}: count keyword is channel-indexed"))
                }
                Some(_) => {}
            }
        }

        problems
    }
}

/// Lowercase the first character of a keyword: `AmbientTemperature` →
/// `ambientTemperature`.
#[must_use]
pub fn camel_case(keyword: &str) -> String {
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enum_table::EnumEntry;
    use rstest::rstest;

    static GAINS: EnumTable = EnumTable::new("gain", &[EnumEntry::new("LOW", 0, &[])]);

    static DESCRIPTORS: [KeywordDescriptor; 4] = [
        KeywordDescriptor::scalar("InputCount", "inputCount"),
        KeywordDescriptor::scalar("Ambient", "ambient").emittable(),
        KeywordDescriptor::channel("Reading", "reading").emittable(),
        KeywordDescriptor::channel("Gain", "gain")
            .decode_as(DecodeRule::Enum(&GAINS))
            .command(CommandRule::Enumerated),
    ];

    static REGISTRY: KeywordRegistry =
        KeywordRegistry::new("TestBoard", &DESCRIPTORS).with_count_keyword("InputCount");

    #[rstest]
    #[case("AmbientTemperature", "ambientTemperature")]
    #[case("Temperature", "temperature")]
    #[case("x", "x")]
    #[case("", "")]
    fn test_camel_case(#[case] keyword: &str, #[case] expected: &str) {
        assert_eq!(camel_case(keyword), expected);
    }

    #[test]
    fn test_lookup() {
        let gain = REGISTRY.lookup("Gain").unwrap();
        assert_eq!(gain.field(), "gain");
        assert!(gain.is_indexed());
        assert!(!gain.is_emittable());
        assert_eq!(gain.command_rule(), Some(CommandRule::Enumerated));
        assert_eq!(gain.enum_table().map(EnumTable::name), Some("gain"));

        assert!(REGISTRY.lookup("gain").is_none());
        assert!(REGISTRY.lookup("Unknown").is_none());
    }

    #[test]
    fn test_emittable_subset() {
        let names: Vec<_> = REGISTRY.emittable().map(|d| d.keyword()).collect();
        assert_eq!(names, vec!["Ambient", "Reading"]);
        assert!(REGISTRY.emittable().count() < REGISTRY.len());
    }

    #[test]
    fn test_count_keyword() {
        assert!(REGISTRY.is_count_keyword("InputCount"));
        assert!(!REGISTRY.is_count_keyword("Ambient"));
        assert_eq!(REGISTRY.device_class(), "TestBoard");
    }

    #[test]
    fn test_consistent_registry() {
        assert!(REGISTRY.inconsistencies().is_empty());
    }

    #[test]
    fn test_inconsistencies_reported() {
        static BAD: [KeywordDescriptor; 3] = [
            KeywordDescriptor::scalar("Level", "level_value"),
            KeywordDescriptor::channel("Mode", "mode").command(CommandRule::Enumerated),
            KeywordDescriptor::channel("Mode", "mode"),
        ];
        static BAD_REGISTRY: KeywordRegistry =
            KeywordRegistry::new("Bad", &BAD).with_count_keyword("Mode");

        let problems = BAD_REGISTRY.inconsistencies();
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("camelCase")));
        assert!(problems.iter().any(|p| p.contains("duplicate")));
        assert!(problems.iter().any(|p| p.contains("without enum table")));
        assert!(problems.iter().any(|p| p.contains("channel-indexed")));
    }
}
