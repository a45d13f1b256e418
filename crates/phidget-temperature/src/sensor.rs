//! Typed facade of the thermocouple temperature sensor.
//!
//! [`TemperatureSensor`] wraps a generic [`Device`] bound to the
//! [`TEMPERATURE_SENSOR`] registry and adds typed getters and the two
//! configuration commands.
//!
//! # Examples
//!
//! ```
//! use phidget_device::mock::RecordingTransport;
//! use phidget_protocol::UpdateMessage;
//! use phidget_temperature::{TemperatureSensor, ThermocoupleType};
//!
//! # fn main() -> phidget_core::Result<()> {
//! let mut sensor = TemperatureSensor::new(RecordingTransport::new());
//! sensor.subscribe("temperature", |_, event| println!("{event:?}"));
//! sensor.attach();
//!
//! sensor.handle_update(&UpdateMessage::scalar("TemperatureInputCount", "4"));
//! sensor.handle_update(&UpdateMessage::indexed("Temperature", 2, "101.2"));
//! sensor
//!     .set_thermocouple_type([0, 1], "k")?
//!     .set_temperature_change_trigger(2, 0.5)?;
//!
//! assert_eq!(sensor.input_count(), Some(4));
//! assert_eq!(sensor.input(2).and_then(|i| i.temperature()), Some(101.2));
//! assert_eq!(sensor.input(0).and_then(|i| i.thermocouple_type()), Some(ThermocoupleType::K));
//! # Ok(())
//! # }
//! ```

use crate::keywords::{TEMPERATURE_CHANGE_TRIGGER, TEMPERATURE_SENSOR, THERMOCOUPLE_TYPE, fields};
use crate::thermocouple::ThermocoupleType;
use phidget_core::{ChannelIndex, DeviceConfig, DeviceKey, Error, IndexSet, Result};
use phidget_device::{
    ApplyOutcome, Channel, Device, DeviceActor, DeviceHandle, DeviceSnapshot, DeviceState, Event,
    SubscriptionId, Transport, TriggerValue,
};
use phidget_protocol::{EnumInput, UpdateMessage};

/// Thermocouple temperature sensor.
#[derive(Debug)]
pub struct TemperatureSensor<T> {
    device: Device<T>,
}

impl<T: Transport> TemperatureSensor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            device: Device::new(&TEMPERATURE_SENSOR, transport),
        }
    }

    pub fn with_config(transport: T, config: DeviceConfig) -> Self {
        Self {
            device: Device::with_config(&TEMPERATURE_SENSOR, transport, config),
        }
    }

    /// Wrap a generic device.
    ///
    /// # Errors
    /// Returns `Error::Config` if the device is not bound to the temperature
    /// sensor registry.
    pub fn from_device(device: Device<T>) -> Result<Self> {
        if !std::ptr::eq(device.registry(), &TEMPERATURE_SENSOR) {
            return Err(Error::Config(format!(
                "expected a {} device, got {}",
                TEMPERATURE_SENSOR.device_class(),
                device.registry().device_class()
            )));
        }
        Ok(Self { device })
    }

    #[must_use]
    pub fn into_device(self) -> Device<T> {
        self.device
    }

    #[must_use]
    pub fn device(&self) -> &Device<T> {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut Device<T> {
        &mut self.device
    }

    pub fn attach(&mut self) {
        self.device.attach();
    }

    pub fn detach(&mut self) {
        self.device.detach();
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.device.is_ready()
    }

    pub fn handle_update(&mut self, update: &UpdateMessage) -> ApplyOutcome {
        self.device.handle_update(update)
    }

    pub fn subscribe<F>(&mut self, name: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&DeviceState, &Event) + Send + 'static,
    {
        self.device.subscribe(name, handler)
    }

    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&DeviceState, &Event) + Send + 'static,
    {
        self.device.subscribe_all(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.device.unsubscribe(id)
    }

    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.device.snapshot()
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        self.device.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.device.transport_mut()
    }

    /// Board temperature in °C.
    #[must_use]
    pub fn ambient_temperature(&self) -> Option<f64> {
        self.device.state().scalar_number(fields::AMBIENT_TEMPERATURE)
    }

    #[must_use]
    pub fn ambient_temperature_max(&self) -> Option<f64> {
        self.device.state().scalar_number(fields::AMBIENT_TEMPERATURE_MAX)
    }

    #[must_use]
    pub fn ambient_temperature_min(&self) -> Option<f64> {
        self.device.state().scalar_number(fields::AMBIENT_TEMPERATURE_MIN)
    }

    /// Number of thermocouple inputs reported by the controller.
    #[must_use]
    pub fn input_count(&self) -> Option<u32> {
        self.device.state().channel_count()
    }

    /// View of one input, if the controller or a command has referenced it.
    #[must_use]
    pub fn input(&self, index: ChannelIndex) -> Option<InputView<'_>> {
        self.device.state().channel(index).map(InputView::new)
    }

    /// Inputs in index order.
    pub fn inputs(&self) -> impl Iterator<Item = InputView<'_>> {
        self.device.state().channels().map(InputView::new)
    }

    /// Set the temperature change trigger of each addressed input.
    ///
    /// # Errors
    /// Returns `Error::Validation` unless the value is a finite number >= 0.
    pub fn set_temperature_change_trigger(
        &mut self,
        indices: impl Into<IndexSet>,
        value: impl Into<TriggerValue>,
    ) -> Result<&mut Self> {
        self.device
            .set_change_trigger(TEMPERATURE_CHANGE_TRIGGER, indices, value)?;
        Ok(self)
    }

    /// Set the thermocouple type of each addressed input. Accepts a
    /// [`ThermocoupleType`], an alias such as `"k"` or `"TYPE_K"`, or a wire
    /// code.
    ///
    /// # Errors
    /// Returns `Error::Validation` for an unknown alias or code.
    pub fn set_thermocouple_type(
        &mut self,
        indices: impl Into<IndexSet>,
        value: impl Into<EnumInput>,
    ) -> Result<&mut Self> {
        self.device
            .set_enumerated(THERMOCOUPLE_TYPE, indices, value)?;
        Ok(self)
    }
}

impl<T: Transport + 'static> TemperatureSensor<T> {
    /// Move the sensor into an actor task.
    pub fn into_actor(self, key: DeviceKey) -> (DeviceActor<T>, TemperatureSensorHandle) {
        let (actor, handle) = DeviceActor::new(key, self.device);
        (actor, TemperatureSensorHandle::new(handle))
    }
}

/// Read-only view of one thermocouple input.
#[derive(Debug, Clone, Copy)]
pub struct InputView<'a> {
    channel: &'a Channel,
}

impl<'a> InputView<'a> {
    fn new(channel: &'a Channel) -> Self {
        Self { channel }
    }

    #[must_use]
    pub fn index(&self) -> ChannelIndex {
        self.channel.index()
    }

    /// Thermocouple temperature in °C.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.channel.number(fields::TEMPERATURE)
    }

    #[must_use]
    pub fn temperature_max(&self) -> Option<f64> {
        self.channel.number(fields::TEMPERATURE_MAX)
    }

    #[must_use]
    pub fn temperature_min(&self) -> Option<f64> {
        self.channel.number(fields::TEMPERATURE_MIN)
    }

    /// Thermocouple voltage in V.
    #[must_use]
    pub fn potential(&self) -> Option<f64> {
        self.channel.number(fields::POTENTIAL)
    }

    #[must_use]
    pub fn potential_max(&self) -> Option<f64> {
        self.channel.number(fields::POTENTIAL_MAX)
    }

    #[must_use]
    pub fn potential_min(&self) -> Option<f64> {
        self.channel.number(fields::POTENTIAL_MIN)
    }

    /// `None` until set, or if the controller reported an unknown code.
    #[must_use]
    pub fn thermocouple_type(&self) -> Option<ThermocoupleType> {
        self.channel
            .code(fields::THERMOCOUPLE_TYPE)
            .and_then(ThermocoupleType::from_code)
    }

    #[must_use]
    pub fn temperature_change_trigger(&self) -> Option<f64> {
        self.channel.number(fields::TEMPERATURE_CHANGE_TRIGGER)
    }
}

/// Async handle to a sensor running in a [`DeviceActor`].
#[derive(Debug, Clone)]
pub struct TemperatureSensorHandle {
    inner: DeviceHandle,
}

impl TemperatureSensorHandle {
    pub fn new(inner: DeviceHandle) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn device(&self) -> &DeviceHandle {
        &self.inner
    }

    pub async fn update(&self, update: UpdateMessage) -> Result<()> {
        self.inner.update(update).await
    }

    pub async fn attach(&self) -> Result<()> {
        self.inner.attach().await
    }

    pub async fn detach(&self) -> Result<()> {
        self.inner.detach().await
    }

    pub async fn set_temperature_change_trigger(
        &self,
        indices: impl Into<IndexSet>,
        value: impl Into<TriggerValue>,
    ) -> Result<()> {
        self.inner
            .set_change_trigger(TEMPERATURE_CHANGE_TRIGGER, indices, value)
            .await
    }

    pub async fn set_thermocouple_type(
        &self,
        indices: impl Into<IndexSet>,
        value: impl Into<EnumInput>,
    ) -> Result<()> {
        self.inner
            .set_enumerated(THERMOCOUPLE_TYPE, indices, value)
            .await
    }

    pub async fn snapshot(&self) -> Result<DeviceSnapshot> {
        self.inner.snapshot().await
    }
}
