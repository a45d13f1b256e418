//! Thermocouple temperature sensor.
//!
//! A multi-input board reporting per-input thermocouple temperature and
//! voltage plus a device-wide ambient (cold junction) temperature. Inputs
//! are configured with a thermocouple type and a change trigger.
//!
//! - [`keywords`]: the sensor's keyword table
//! - [`thermocouple`]: supported thermocouple types
//! - [`sensor`]: typed facade and async handle

pub mod keywords;
pub mod sensor;
pub mod thermocouple;

pub use keywords::TEMPERATURE_SENSOR;
pub use sensor::{InputView, TemperatureSensor, TemperatureSensorHandle};
pub use thermocouple::{THERMOCOUPLE_TYPES, ThermocoupleType};
