//! Outbound command validation.
//!
//! A command is planned in full before anything is written or sent: the
//! keyword must accept the command kind and the value must be in its domain.
//! A [`CommandPlan`] is the validated result; the device applies it to every
//! addressed channel.

use phidget_core::{Error, IndexSet, Result, Value};
use phidget_protocol::{
    CommandRule, EnumInput, KeywordDescriptor, KeywordRegistry, OutboundCommand, ParameterKey,
    parse_number,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Change-trigger input: a number, or text to be parsed as one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for TriggerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for TriggerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for TriggerValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for TriggerValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for TriggerValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for TriggerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TriggerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Check a change-trigger threshold: finite and not negative.
///
/// Negative zero is normalized to zero.
///
/// # Errors
/// Returns `Error::Validation` for negative, infinite or NaN values.
pub fn validate_change_trigger(keyword: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value + 0.0)
    } else {
        Err(trigger_error(keyword))
    }
}

/// Parse and validate change-trigger input.
///
/// # Errors
/// Returns `Error::Validation` if text does not parse or the value is out of
/// range.
pub fn parse_change_trigger(keyword: &str, input: &TriggerValue) -> Result<f64> {
    let value = match input {
        TriggerValue::Number(n) => *n,
        TriggerValue::Text(text) => parse_number(text).ok_or_else(|| trigger_error(keyword))?,
    };
    validate_change_trigger(keyword, value)
}

fn trigger_error(keyword: &str) -> Error {
    Error::validation(format!(
        "{keyword} must be a floating-point number greater than or equal to 0"
    ))
}

/// A validated set-command: one value for a list of channels.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandPlan {
    descriptor: &'static KeywordDescriptor,
    indices: IndexSet,
    value: Value,
}

impl CommandPlan {
    #[must_use]
    pub fn descriptor(&self) -> &'static KeywordDescriptor {
        self.descriptor
    }

    #[must_use]
    pub fn indices(&self) -> &IndexSet {
        &self.indices
    }

    /// Normalized value written to every channel.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// One persistent command per addressed channel, in index order given.
    pub fn commands(&self) -> impl Iterator<Item = OutboundCommand> + '_ {
        self.indices.iter().map(|index| {
            OutboundCommand::set(
                ParameterKey::indexed(self.descriptor.keyword(), index),
                &self.value,
            )
        })
    }
}

/// Plan a change-trigger command.
///
/// # Errors
/// `UnknownKeyword` or `NotWritable` if the keyword does not accept change
/// triggers; `Validation` if the value is out of range.
pub fn plan_change_trigger(
    registry: &KeywordRegistry,
    keyword: &str,
    indices: IndexSet,
    value: &TriggerValue,
) -> Result<CommandPlan> {
    let descriptor = writable(registry, keyword, CommandRule::ChangeTrigger)?;
    let value = parse_change_trigger(keyword, value)?;
    Ok(CommandPlan {
        descriptor,
        indices,
        value: Value::Number(value),
    })
}

/// Plan an enumerated-mode command. The input is normalized to its wire code.
///
/// # Errors
/// `UnknownKeyword` or `NotWritable` if the keyword does not accept
/// enumerated commands; `Validation` for an unknown alias or code.
pub fn plan_enumerated(
    registry: &KeywordRegistry,
    keyword: &str,
    indices: IndexSet,
    input: &EnumInput,
) -> Result<CommandPlan> {
    let descriptor = writable(registry, keyword, CommandRule::Enumerated)?;
    let table = descriptor
        .enum_table()
        .ok_or_else(|| Error::not_writable(keyword, CommandRule::Enumerated.to_string()))?;
    let code = table.resolve(input)?;
    Ok(CommandPlan {
        descriptor,
        indices,
        value: Value::Code(code),
    })
}

fn writable(
    registry: &KeywordRegistry,
    keyword: &str,
    rule: CommandRule,
) -> Result<&'static KeywordDescriptor> {
    let descriptor = registry
        .lookup(keyword)
        .ok_or_else(|| Error::UnknownKeyword(keyword.to_string()))?;

    if descriptor.command_rule() != Some(rule) {
        return Err(Error::not_writable(keyword, rule.to_string()));
    }
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phidget_protocol::{DecodeRule, EnumEntry, EnumTable};
    use rstest::rstest;

    static MODES: EnumTable = EnumTable::new(
        "mode",
        &[
            EnumEntry::new("SLOW", 0, &["MODE_SLOW"]),
            EnumEntry::new("FAST", 1, &["MODE_FAST"]),
        ],
    );

    static KEYWORDS: [KeywordDescriptor; 3] = [
        KeywordDescriptor::channel("Level", "level").emittable(),
        KeywordDescriptor::channel("LevelChangeTrigger", "levelChangeTrigger")
            .command(CommandRule::ChangeTrigger),
        KeywordDescriptor::channel("Mode", "mode")
            .decode_as(DecodeRule::Enum(&MODES))
            .command(CommandRule::Enumerated),
    ];
    static REGISTRY: KeywordRegistry = KeywordRegistry::new("TestBoard", &KEYWORDS);

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(-0.0, 0.0)]
    #[case(2.5, 2.5)]
    #[case(1e9, 1e9)]
    fn test_valid_change_trigger(#[case] input: f64, #[case] expected: f64) {
        let value = validate_change_trigger("LevelChangeTrigger", input).unwrap();
        assert_eq!(value, expected);
        assert!(value.is_sign_positive());
    }

    #[rstest]
    #[case(-1.0)]
    #[case(-0.001)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn test_invalid_change_trigger(#[case] input: f64) {
        let error = validate_change_trigger("LevelChangeTrigger", input).unwrap_err();
        assert!(error.is_validation());
        assert!(error.to_string().contains("greater than or equal to 0"));
    }

    #[rstest]
    #[case(TriggerValue::from("2.5"), Some(2.5))]
    #[case(TriggerValue::from(" 3 "), Some(3.0))]
    #[case(TriggerValue::from(4), Some(4.0))]
    #[case(TriggerValue::from("abc"), None)]
    #[case(TriggerValue::from(""), None)]
    #[case(TriggerValue::from("-2"), None)]
    fn test_parse_change_trigger(#[case] input: TriggerValue, #[case] expected: Option<f64>) {
        assert_eq!(parse_change_trigger("Trigger", &input).ok(), expected);
    }

    #[test]
    fn test_plan_change_trigger_commands() {
        let plan = plan_change_trigger(
            &REGISTRY,
            "LevelChangeTrigger",
            IndexSet::from([0, 2]),
            &TriggerValue::from(1.5),
        )
        .unwrap();

        assert_eq!(plan.value(), &Value::Number(1.5));
        let commands: Vec<_> = plan.commands().map(|c| c.to_string()).collect();
        assert_eq!(commands, vec!["LevelChangeTrigger/0=1.5", "LevelChangeTrigger/2=1.5"]);
        assert!(plan.commands().all(|c| c.persistent));
    }

    #[rstest]
    #[case(EnumInput::from("fast"))]
    #[case(EnumInput::from("MODE_FAST"))]
    #[case(EnumInput::from(1))]
    fn test_plan_enumerated_normalizes(#[case] input: EnumInput) {
        let plan = plan_enumerated(&REGISTRY, "Mode", IndexSet::from(3), &input).unwrap();
        assert_eq!(plan.value(), &Value::Code(1));
        assert_eq!(plan.commands().next().unwrap().to_string(), "Mode/3=1");
    }

    #[rstest]
    #[case(EnumInput::from("medium"))]
    #[case(EnumInput::from(5))]
    #[case(EnumInput::from(-1))]
    fn test_plan_enumerated_rejects(#[case] input: EnumInput) {
        let error = plan_enumerated(&REGISTRY, "Mode", IndexSet::from(0), &input).unwrap_err();
        assert!(error.is_validation());
    }

    #[test]
    fn test_plan_unknown_keyword() {
        let result = plan_change_trigger(
            &REGISTRY,
            "Missing",
            IndexSet::from(0),
            &TriggerValue::from(1.0),
        );
        assert!(matches!(result, Err(Error::UnknownKeyword(k)) if k == "Missing"));
    }

    #[rstest]
    #[case("Level")]
    #[case("Mode")]
    fn test_plan_not_writable(#[case] keyword: &str) {
        let result =
            plan_change_trigger(&REGISTRY, keyword, IndexSet::from(0), &TriggerValue::from(1.0));
        assert!(matches!(result, Err(Error::NotWritable { .. })));
    }

    #[test]
    fn test_empty_index_set_plans_no_commands() {
        let plan = plan_enumerated(&REGISTRY, "Mode", IndexSet::default(), &EnumInput::from("slow"))
            .unwrap();
        assert_eq!(plan.commands().count(), 0);
    }
}
