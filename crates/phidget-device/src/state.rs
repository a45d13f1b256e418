//! Device state store.
//!
//! [`DeviceState`] mirrors the controller: device-wide scalar attributes and
//! an ordered map of per-channel attribute maps. It is mutated only by
//! [`DeviceState::apply`] (inbound updates) and by optimistic write-through of
//! configuration values from validated commands.
//!
//! # Apply Algorithm
//!
//! 1. Resolve the keyword; unknown keywords are ignored.
//! 2. Channel keywords without an index are ignored.
//! 3. Decode the raw value. Malformed input becomes a NaN sentinel
//!    (permissive) or is ignored (strict).
//! 4. Write the scalar, or lazily create the channel and write its field.
//! 5. The registry's count keyword also updates `channel_count`.
//!
//! ```
//! use phidget_core::InboundPolicy;
//! use phidget_device::state::{ApplyOutcome, DeviceState};
//! use phidget_protocol::{KeywordDescriptor, KeywordRegistry};
//!
//! static KEYWORDS: [KeywordDescriptor; 1] =
//!     [KeywordDescriptor::channel("Voltage", "voltage").emittable()];
//! static REGISTRY: KeywordRegistry = KeywordRegistry::new("Example", &KEYWORDS);
//!
//! let mut state = DeviceState::new(&REGISTRY, InboundPolicy::Permissive);
//! let outcome = state.apply("Voltage", Some(1), "4.98");
//! assert!(matches!(outcome, ApplyOutcome::Applied(_)));
//! assert_eq!(state.channel(1).unwrap().number("voltage"), Some(4.98));
//! ```

use chrono::{DateTime, Utc};
use phidget_core::{ChannelIndex, InboundPolicy, Value};
use phidget_protocol::{Decoded, KeywordDescriptor, KeywordRegistry, decode_value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// One addressable sub-unit of a device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    index: ChannelIndex,
    attributes: BTreeMap<&'static str, Value>,
}

impl Channel {
    fn new(index: ChannelIndex) -> Self {
        Self {
            index,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn index(&self) -> ChannelIndex {
        self.index
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Numeric attribute. `None` if never received or not numeric.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_number)
    }

    /// Enumerated attribute as its wire code.
    #[must_use]
    pub fn code(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_code)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.attributes.iter().map(|(field, value)| (*field, value))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    fn set(&mut self, field: &'static str, value: Value) {
        self.attributes.insert(field, value);
    }
}

/// Why an inbound update was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Keyword not in the registry.
    UnknownKeyword,

    /// Channel keyword arrived without an index.
    MissingIndex,

    /// Malformed value rejected by the strict inbound policy.
    Rejected,
}

/// An update that changed state, handed on to the event dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedUpdate {
    descriptor: &'static KeywordDescriptor,
    index: Option<ChannelIndex>,
    value: Value,
}

impl AppliedUpdate {
    #[must_use]
    pub fn descriptor(&self) -> &'static KeywordDescriptor {
        self.descriptor
    }

    #[must_use]
    pub fn keyword(&self) -> &'static str {
        self.descriptor.keyword()
    }

    /// Channel index; `None` for device-wide keywords.
    #[must_use]
    pub fn index(&self) -> Option<ChannelIndex> {
        self.index
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Outcome of [`DeviceState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(AppliedUpdate),
    Ignored(IgnoreReason),
}

impl ApplyOutcome {
    #[must_use]
    pub fn applied(&self) -> Option<&AppliedUpdate> {
        match self {
            Self::Applied(update) => Some(update),
            Self::Ignored(_) => None,
        }
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }
}

/// Local mirror of a device's scalar and per-channel state.
#[derive(Debug, Clone)]
pub struct DeviceState {
    registry: &'static KeywordRegistry,
    policy: InboundPolicy,
    scalars: BTreeMap<&'static str, Value>,
    channels: BTreeMap<ChannelIndex, Channel>,
    channel_count: Option<u32>,
    updated_at: Option<DateTime<Utc>>,
}

impl DeviceState {
    pub fn new(registry: &'static KeywordRegistry, policy: InboundPolicy) -> Self {
        Self {
            registry,
            policy,
            scalars: BTreeMap::new(),
            channels: BTreeMap::new(),
            channel_count: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &'static KeywordRegistry {
        self.registry
    }

    #[must_use]
    pub fn policy(&self) -> InboundPolicy {
        self.policy
    }

    /// Apply one inbound update.
    pub fn apply(&mut self, keyword: &str, index: Option<ChannelIndex>, raw: &str) -> ApplyOutcome {
        let Some(descriptor) = self.registry.lookup(keyword) else {
            trace!(keyword, "Ignoring unknown keyword");
            return ApplyOutcome::Ignored(IgnoreReason::UnknownKeyword);
        };

        if descriptor.is_indexed() && index.is_none() {
            warn!(keyword, "Ignoring channel keyword without index");
            return ApplyOutcome::Ignored(IgnoreReason::MissingIndex);
        }

        let value = match decode_value(descriptor.decode(), raw) {
            Decoded::Valid(value) => value,
            Decoded::Malformed(sentinel) => match self.policy {
                InboundPolicy::Permissive => {
                    warn!(keyword, ?index, raw, "Storing malformed value as sentinel");
                    sentinel
                }
                InboundPolicy::Strict => {
                    warn!(keyword, ?index, raw, "Rejecting malformed value");
                    return ApplyOutcome::Ignored(IgnoreReason::Rejected);
                }
            },
        };

        let index = if descriptor.is_indexed() {
            index
        } else {
            None
        };

        match index {
            Some(index) => self.channel_mut(index).set(descriptor.field(), value.clone()),
            None => {
                self.scalars.insert(descriptor.field(), value.clone());
                if self.registry.is_count_keyword(keyword) {
                    self.update_channel_count(&value);
                }
            }
        }

        self.updated_at = Some(Utc::now());
        debug!(keyword, ?index, %value, "Applied update");

        ApplyOutcome::Applied(AppliedUpdate {
            descriptor,
            index,
            value,
        })
    }

    /// Optimistically record a configuration value sent to the controller.
    pub(crate) fn write_through(
        &mut self,
        descriptor: &'static KeywordDescriptor,
        index: ChannelIndex,
        value: Value,
    ) {
        self.channel_mut(index).set(descriptor.field(), value);
    }

    fn channel_mut(&mut self, index: ChannelIndex) -> &mut Channel {
        self.channels
            .entry(index)
            .or_insert_with(|| Channel::new(index))
    }

    fn update_channel_count(&mut self, value: &Value) {
        match value.as_number() {
            Some(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => {
                self.channel_count = Some(n as u32);
            }
            _ => warn!(%value, "Ignoring unusable channel count"),
        }
    }

    /// Device-wide attribute by field name.
    #[must_use]
    pub fn scalar(&self, field: &str) -> Option<&Value> {
        self.scalars.get(field)
    }

    /// Numeric device-wide attribute.
    #[must_use]
    pub fn scalar_number(&self, field: &str) -> Option<f64> {
        self.scalar(field).and_then(Value::as_number)
    }

    pub fn scalars(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.scalars.iter().map(|(field, value)| (*field, value))
    }

    #[must_use]
    pub fn channel(&self, index: ChannelIndex) -> Option<&Channel> {
        self.channels.get(&index)
    }

    /// Channels in index order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Channel count reported by the controller, if any.
    #[must_use]
    pub fn channel_count(&self) -> Option<u32> {
        self.channel_count
    }

    /// Time of the last applied inbound update.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn snapshot(&self, ready: bool) -> DeviceSnapshot {
        DeviceSnapshot {
            device_class: self.registry.device_class().to_string(),
            ready,
            scalars: self
                .scalars
                .iter()
                .map(|(field, value)| ((*field).to_string(), value.clone()))
                .collect(),
            channels: self
                .channels
                .iter()
                .map(|(index, channel)| {
                    let attributes = channel
                        .attributes
                        .iter()
                        .map(|(field, value)| ((*field).to_string(), value.clone()))
                        .collect();
                    (*index, attributes)
                })
                .collect(),
            channel_count: self.channel_count,
            updated_at: self.updated_at,
        }
    }
}

/// Serializable point-in-time copy of a device's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub device_class: String,
    pub ready: bool,
    pub scalars: BTreeMap<String, Value>,
    pub channels: BTreeMap<ChannelIndex, BTreeMap<String, Value>>,
    pub channel_count: Option<u32>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use phidget_protocol::{CommandRule, DecodeRule, EnumEntry, EnumTable};
    use rstest::rstest;

    static RANGES: EnumTable = EnumTable::new(
        "range",
        &[EnumEntry::new("LOW", 0, &[]), EnumEntry::new("HIGH", 1, &[])],
    );

    static KEYWORDS: [KeywordDescriptor; 5] = [
        KeywordDescriptor::scalar("Supply", "supply").emittable(),
        KeywordDescriptor::scalar("InputCount", "inputCount"),
        KeywordDescriptor::channel("Level", "level").emittable(),
        KeywordDescriptor::channel("Range", "range")
            .decode_as(DecodeRule::Enum(&RANGES))
            .command(CommandRule::Enumerated),
        KeywordDescriptor::channel("Label", "label").decode_as(DecodeRule::Text),
    ];

    static REGISTRY: KeywordRegistry =
        KeywordRegistry::new("TestBoard", &KEYWORDS).with_count_keyword("InputCount");

    fn permissive() -> DeviceState {
        DeviceState::new(&REGISTRY, InboundPolicy::Permissive)
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = permissive();
        assert_eq!(state.scalars().count(), 0);
        assert_eq!(state.channels().count(), 0);
        assert_eq!(state.channel_count(), None);
        assert_eq!(state.updated_at(), None);
    }

    #[test]
    fn test_apply_scalar() {
        let mut state = permissive();
        let outcome = state.apply("Supply", None, "5.02");

        let update = outcome.applied().unwrap();
        assert_eq!(update.keyword(), "Supply");
        assert_eq!(update.index(), None);
        assert_eq!(update.value(), &Value::Number(5.02));
        assert_eq!(state.scalar_number("supply"), Some(5.02));
        assert!(state.updated_at().is_some());
    }

    #[test]
    fn test_apply_channel_creates_lazily() {
        let mut state = permissive();
        state.apply("Level", Some(3), "0.75");

        assert_eq!(state.channels().count(), 1);
        let channel = state.channel(3).unwrap();
        assert_eq!(channel.index(), 3);
        assert_eq!(channel.number("level"), Some(0.75));
        assert!(state.channel(0).is_none());
    }

    #[test]
    fn test_channels_are_ordered() {
        let mut state = permissive();
        state.apply("Level", Some(5), "1");
        state.apply("Level", Some(0), "1");
        state.apply("Level", Some(2), "1");

        let indices: Vec<_> = state.channels().map(Channel::index).collect();
        assert_eq!(indices, vec![0, 2, 5]);
    }

    #[test]
    fn test_unknown_keyword_is_ignored() {
        let mut state = permissive();
        let outcome = state.apply("FutureKeyword", Some(1), "9");

        assert_eq!(outcome, ApplyOutcome::Ignored(IgnoreReason::UnknownKeyword));
        assert_eq!(state.channels().count(), 0);
        assert_eq!(state.scalars().count(), 0);
        assert_eq!(state.updated_at(), None);
    }

    #[test]
    fn test_channel_keyword_without_index_is_ignored() {
        let mut state = permissive();
        let outcome = state.apply("Level", None, "1");

        assert_eq!(outcome, ApplyOutcome::Ignored(IgnoreReason::MissingIndex));
        assert_eq!(state.channels().count(), 0);
    }

    #[test]
    fn test_scalar_keyword_disregards_index() {
        let mut state = permissive();
        let outcome = state.apply("Supply", Some(4), "4.9");

        assert_eq!(outcome.applied().unwrap().index(), None);
        assert_eq!(state.scalar_number("supply"), Some(4.9));
        assert!(state.channel(4).is_none());
    }

    #[test]
    fn test_permissive_stores_sentinel() {
        let mut state = permissive();
        let outcome = state.apply("Level", Some(0), "overrange");

        assert!(outcome.applied().unwrap().value().is_nan());
        assert!(state.channel(0).unwrap().get("level").unwrap().is_nan());
    }

    #[test]
    fn test_strict_rejects_malformed() {
        let mut state = DeviceState::new(&REGISTRY, InboundPolicy::Strict);
        state.apply("Level", Some(0), "1.5");
        let outcome = state.apply("Level", Some(0), "overrange");

        assert_eq!(outcome, ApplyOutcome::Ignored(IgnoreReason::Rejected));
        assert_eq!(state.channel(0).unwrap().number("level"), Some(1.5));
    }

    #[test]
    fn test_enum_stored_as_code() {
        let mut state = permissive();
        state.apply("Range", Some(1), "1");
        assert_eq!(state.channel(1).unwrap().code("range"), Some(1));
        assert_eq!(state.channel(1).unwrap().number("range"), None);
    }

    #[test]
    fn test_text_value() {
        let mut state = permissive();
        state.apply("Label", Some(0), "kiln A");
        assert_eq!(
            state.channel(0).unwrap().get("label"),
            Some(&Value::Text("kiln A".to_string()))
        );
    }

    #[rstest]
    #[case("4", Some(4))]
    #[case("0", Some(0))]
    #[case("2.5", None)]
    #[case("-1", None)]
    #[case("many", None)]
    fn test_channel_count(#[case] raw: &str, #[case] expected: Option<u32>) {
        let mut state = permissive();
        state.apply("InputCount", None, raw);
        assert_eq!(state.channel_count(), expected);
    }

    #[test]
    fn test_channel_count_keeps_previous_on_bad_value() {
        let mut state = permissive();
        state.apply("InputCount", None, "4");
        state.apply("InputCount", None, "garbage");
        assert_eq!(state.channel_count(), Some(4));
        assert!(state.scalar("inputCount").unwrap().is_nan());
    }

    #[test]
    fn test_write_through() {
        let mut state = permissive();
        let descriptor = REGISTRY.lookup("Range").unwrap();
        state.write_through(descriptor, 2, Value::Code(0));

        assert_eq!(state.channel(2).unwrap().code("range"), Some(0));
        assert_eq!(state.updated_at(), None);
    }

    #[test]
    fn test_snapshot() {
        let mut state = permissive();
        state.apply("Supply", None, "5");
        state.apply("InputCount", None, "2");
        state.apply("Level", Some(1), "0.5");

        let snapshot = state.snapshot(true);
        assert_eq!(snapshot.device_class, "TestBoard");
        assert!(snapshot.ready);
        assert_eq!(snapshot.scalars.get("supply"), Some(&Value::Number(5.0)));
        assert_eq!(snapshot.channels[&1].get("level"), Some(&Value::Number(0.5)));
        assert_eq!(snapshot.channel_count, Some(2));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["channels"]["1"]["level"]["value"], 0.5);
    }
}
