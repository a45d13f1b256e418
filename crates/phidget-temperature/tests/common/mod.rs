//! Shared helpers for the temperature sensor integration tests.

#![allow(dead_code)]

use phidget_core::{DeviceConfig, InboundPolicy};
use phidget_device::Event;
use phidget_device::mock::RecordingTransport;
use phidget_protocol::UpdateMessage;
use phidget_temperature::TemperatureSensor;
use std::sync::{Arc, Mutex, Once};

/// Serial number used by single-device tests.
pub const TEST_SERIAL: u32 = 370_123;

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub type Sensor = TemperatureSensor<RecordingTransport>;

/// Sensor that has not been attached yet.
pub fn detached_sensor() -> Sensor {
    init_tracing();
    TemperatureSensor::new(RecordingTransport::new())
}

/// Attached sensor with the given inbound policy.
pub fn attached_sensor_with(policy: InboundPolicy) -> Sensor {
    init_tracing();
    let config = DeviceConfig::named("test-sensor").with_inbound_policy(policy);
    let mut sensor = TemperatureSensor::with_config(RecordingTransport::new(), config);
    sensor.attach();
    sensor
}

pub fn attached_sensor() -> Sensor {
    attached_sensor_with(InboundPolicy::Permissive)
}

/// Record every event the sensor publishes.
pub fn record_events(sensor: &mut Sensor) -> Arc<Mutex<Vec<Event>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    sensor.subscribe_all(move |_, event| sink.lock().unwrap().push(event.clone()));
    seen
}

/// Events recorded so far, excluding lifecycle events.
pub fn changes(seen: &Arc<Mutex<Vec<Event>>>) -> Vec<Event> {
    seen.lock()
        .unwrap()
        .iter()
        .filter(|event| event.change().is_some())
        .cloned()
        .collect()
}

/// Parse `Key=value` into an update.
pub fn update(line: &str) -> UpdateMessage {
    let (key, value) = line.split_once('=').expect("line must be Key=value");
    UpdateMessage::from_key_value(key, value).expect("valid parameter key")
}
