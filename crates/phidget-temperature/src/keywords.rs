//! Keyword table of the thermocouple temperature sensor.

use crate::thermocouple::THERMOCOUPLE_TYPES;
use phidget_protocol::{CommandRule, DecodeRule, KeywordDescriptor, KeywordRegistry};

/// Device class reported by the controller.
pub const DEVICE_CLASS: &str = "PhidgetTemperatureSensor";

pub const AMBIENT_TEMPERATURE: &str = "AmbientTemperature";
pub const AMBIENT_TEMPERATURE_MAX: &str = "AmbientTemperatureMax";
pub const AMBIENT_TEMPERATURE_MIN: &str = "AmbientTemperatureMin";
pub const TEMPERATURE_INPUT_COUNT: &str = "TemperatureInputCount";
pub const TEMPERATURE: &str = "Temperature";
pub const TEMPERATURE_MAX: &str = "TemperatureMax";
pub const TEMPERATURE_MIN: &str = "TemperatureMin";
pub const POTENTIAL: &str = "Potential";
pub const POTENTIAL_MAX: &str = "PotentialMax";
pub const POTENTIAL_MIN: &str = "PotentialMin";
pub const THERMOCOUPLE_TYPE: &str = "ThermocoupleType";
pub const TEMPERATURE_CHANGE_TRIGGER: &str = "TemperatureChangeTrigger";

/// Field and event names.
pub mod fields {
    pub const AMBIENT_TEMPERATURE: &str = "ambientTemperature";
    pub const AMBIENT_TEMPERATURE_MAX: &str = "ambientTemperatureMax";
    pub const AMBIENT_TEMPERATURE_MIN: &str = "ambientTemperatureMin";
    pub const TEMPERATURE_INPUT_COUNT: &str = "temperatureInputCount";
    pub const TEMPERATURE: &str = "temperature";
    pub const TEMPERATURE_MAX: &str = "temperatureMax";
    pub const TEMPERATURE_MIN: &str = "temperatureMin";
    pub const POTENTIAL: &str = "potential";
    pub const POTENTIAL_MAX: &str = "potentialMax";
    pub const POTENTIAL_MIN: &str = "potentialMin";
    pub const THERMOCOUPLE_TYPE: &str = "thermocoupleType";
    pub const TEMPERATURE_CHANGE_TRIGGER: &str = "temperatureChangeTrigger";
}

static KEYWORDS: [KeywordDescriptor; 12] = [
    KeywordDescriptor::scalar(AMBIENT_TEMPERATURE, fields::AMBIENT_TEMPERATURE).emittable(),
    KeywordDescriptor::scalar(AMBIENT_TEMPERATURE_MAX, fields::AMBIENT_TEMPERATURE_MAX),
    KeywordDescriptor::scalar(AMBIENT_TEMPERATURE_MIN, fields::AMBIENT_TEMPERATURE_MIN),
    KeywordDescriptor::scalar(TEMPERATURE_INPUT_COUNT, fields::TEMPERATURE_INPUT_COUNT),
    KeywordDescriptor::channel(TEMPERATURE, fields::TEMPERATURE).emittable(),
    KeywordDescriptor::channel(TEMPERATURE_MAX, fields::TEMPERATURE_MAX),
    KeywordDescriptor::channel(TEMPERATURE_MIN, fields::TEMPERATURE_MIN),
    KeywordDescriptor::channel(POTENTIAL, fields::POTENTIAL).emittable(),
    KeywordDescriptor::channel(POTENTIAL_MAX, fields::POTENTIAL_MAX),
    KeywordDescriptor::channel(POTENTIAL_MIN, fields::POTENTIAL_MIN),
    KeywordDescriptor::channel(THERMOCOUPLE_TYPE, fields::THERMOCOUPLE_TYPE)
        .decode_as(DecodeRule::Enum(&THERMOCOUPLE_TYPES))
        .command(CommandRule::Enumerated),
    KeywordDescriptor::channel(TEMPERATURE_CHANGE_TRIGGER, fields::TEMPERATURE_CHANGE_TRIGGER)
        .command(CommandRule::ChangeTrigger),
];

/// Registry of every keyword the sensor's controller reports.
pub static TEMPERATURE_SENSOR: KeywordRegistry =
    KeywordRegistry::new(DEVICE_CLASS, &KEYWORDS).with_count_keyword(TEMPERATURE_INPUT_COUNT);
