//! Generic device facade.
//!
//! [`Device`] composes the state store, the event dispatcher and a
//! [`Transport`] behind one surface. It owns the readiness flag and is the
//! only entry point for inbound updates.
//!
//! # Lifecycle
//!
//! ```text
//! new ──► (not ready) ──attach──► (ready) ──detach──► (not ready)
//!              │                     │                     │
//!        updates applied       updates applied       updates applied
//!        no events             events emitted        no events
//!        commands no-op        commands sent         commands no-op
//! ```
//!
//! # Examples
//!
//! ```
//! use phidget_device::{Device, mock::RecordingTransport};
//! use phidget_protocol::{CommandRule, KeywordDescriptor, KeywordRegistry, UpdateMessage};
//!
//! static KEYWORDS: [KeywordDescriptor; 2] = [
//!     KeywordDescriptor::channel("Level", "level").emittable(),
//!     KeywordDescriptor::channel("LevelChangeTrigger", "levelChangeTrigger")
//!         .command(CommandRule::ChangeTrigger),
//! ];
//! static REGISTRY: KeywordRegistry = KeywordRegistry::new("Example", &KEYWORDS);
//!
//! # fn main() -> phidget_core::Result<()> {
//! let mut device = Device::new(&REGISTRY, RecordingTransport::new());
//! device.subscribe("level", |_, event| println!("{event:?}"));
//! device.attach();
//!
//! device.handle_update(&UpdateMessage::indexed("Level", 0, "0.42"));
//! device.set_change_trigger("LevelChangeTrigger", [0, 1], 0.05)?;
//!
//! assert_eq!(device.transport().sent().len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::event::{Event, EventDispatcher, SubscriptionId};
use crate::state::{ApplyOutcome, DeviceSnapshot, DeviceState};
use crate::transport::Transport;
use crate::validator::{self, CommandPlan, TriggerValue};
use phidget_core::{ChannelIndex, DeviceConfig, IndexSet, Result};
use phidget_protocol::{EnumInput, KeywordRegistry, UpdateMessage};
use tracing::{debug, info};

/// A device mirrored from its controller.
#[derive(Debug)]
pub struct Device<T> {
    config: DeviceConfig,
    state: DeviceState,
    dispatcher: EventDispatcher,
    transport: T,
    ready: bool,
}

impl<T: Transport> Device<T> {
    /// Create a not-ready device with the default configuration.
    pub fn new(registry: &'static KeywordRegistry, transport: T) -> Self {
        Self::with_config(registry, transport, DeviceConfig::default())
    }

    pub fn with_config(
        registry: &'static KeywordRegistry,
        transport: T,
        config: DeviceConfig,
    ) -> Self {
        Self {
            state: DeviceState::new(registry, config.inbound_policy),
            dispatcher: EventDispatcher::new(),
            transport,
            ready: false,
            config,
        }
    }

    /// Mark the device ready and fire `opened`.
    pub fn attach(&mut self) {
        if self.ready {
            debug!(device = %self.config.name, "Device already attached");
            return;
        }
        self.ready = true;
        info!(
            device = %self.config.name,
            class = self.state.registry().device_class(),
            "Device attached"
        );
        self.dispatcher.publish(&self.state, &Event::Opened);
    }

    /// Fire `closed` and mark the device not ready. State is retained.
    pub fn detach(&mut self) {
        if !self.ready {
            debug!(device = %self.config.name, "Device already detached");
            return;
        }
        self.dispatcher.publish(&self.state, &Event::Closed);
        self.ready = false;
        info!(device = %self.config.name, "Device detached");
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Apply an inbound update and notify subscribers.
    pub fn handle_update(&mut self, update: &UpdateMessage) -> ApplyOutcome {
        self.handle(&update.keyword, update.index, &update.value)
    }

    /// Apply an inbound `(keyword, index, value)` triple and notify subscribers.
    pub fn handle(&mut self, keyword: &str, index: Option<ChannelIndex>, raw: &str) -> ApplyOutcome {
        let outcome = self.state.apply(keyword, index, raw);
        if let ApplyOutcome::Applied(update) = &outcome {
            self.dispatcher.dispatch(&self.state, update, self.ready);
        }
        outcome
    }

    /// Set a change-trigger threshold on each addressed channel.
    ///
    /// Does nothing while the device is not ready.
    ///
    /// # Errors
    /// `Validation` if the value is negative, non-finite or unparsable;
    /// `UnknownKeyword`/`NotWritable` if the keyword takes no change trigger.
    /// Nothing is written or sent on error.
    pub fn set_change_trigger(
        &mut self,
        keyword: &str,
        indices: impl Into<IndexSet>,
        value: impl Into<TriggerValue>,
    ) -> Result<&mut Self> {
        if !self.ready {
            debug!(device = %self.config.name, keyword, "Ignoring command while not ready");
            return Ok(self);
        }
        let plan = validator::plan_change_trigger(
            self.state.registry(),
            keyword,
            indices.into(),
            &value.into(),
        )?;
        self.execute(&plan);
        Ok(self)
    }

    /// Set an enumerated mode on each addressed channel. Aliases are
    /// normalized to the wire code before anything is stored or sent.
    ///
    /// Does nothing while the device is not ready.
    ///
    /// # Errors
    /// `Validation` for an unknown alias or code; `UnknownKeyword`/
    /// `NotWritable` if the keyword takes no enumerated command.
    pub fn set_enumerated(
        &mut self,
        keyword: &str,
        indices: impl Into<IndexSet>,
        value: impl Into<EnumInput>,
    ) -> Result<&mut Self> {
        if !self.ready {
            debug!(device = %self.config.name, keyword, "Ignoring command while not ready");
            return Ok(self);
        }
        let plan = validator::plan_enumerated(
            self.state.registry(),
            keyword,
            indices.into(),
            &value.into(),
        )?;
        self.execute(&plan);
        Ok(self)
    }

    fn execute(&mut self, plan: &CommandPlan) {
        for (index, command) in plan.indices().iter().zip(plan.commands()) {
            self.state
                .write_through(plan.descriptor(), index, plan.value().clone());
            debug!(device = %self.config.name, %command, "Sending command");
            self.transport.transmit(command);
        }
    }

    pub fn subscribe<F>(&mut self, name: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&DeviceState, &Event) + Send + 'static,
    {
        self.dispatcher.subscribe(name, handler)
    }

    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&DeviceState, &Event) + Send + 'static,
    {
        self.dispatcher.subscribe_all(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Current state. Readable regardless of readiness.
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.state.snapshot(self.ready)
    }

    #[must_use]
    pub fn registry(&self) -> &'static KeywordRegistry {
        self.state.registry()
    }

    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingTransport;
    use crate::state::IgnoreReason;
    use phidget_core::{Error, InboundPolicy, Value};
    use phidget_protocol::{CommandRule, DecodeRule, EnumEntry, EnumTable, KeywordDescriptor};
    use std::sync::{Arc, Mutex};

    static MODES: EnumTable = EnumTable::new(
        "mode",
        &[EnumEntry::new("SLOW", 0, &[]), EnumEntry::new("FAST", 1, &[])],
    );

    static KEYWORDS: [KeywordDescriptor; 4] = [
        KeywordDescriptor::scalar("Supply", "supply").emittable(),
        KeywordDescriptor::channel("Level", "level").emittable(),
        KeywordDescriptor::channel("LevelChangeTrigger", "levelChangeTrigger")
            .command(CommandRule::ChangeTrigger),
        KeywordDescriptor::channel("Mode", "mode")
            .decode_as(DecodeRule::Enum(&MODES))
            .command(CommandRule::Enumerated),
    ];
    static REGISTRY: KeywordRegistry = KeywordRegistry::new("TestBoard", &KEYWORDS);

    fn device() -> Device<RecordingTransport> {
        Device::new(&REGISTRY, RecordingTransport::new())
    }

    fn record_events(device: &mut Device<RecordingTransport>) -> Arc<Mutex<Vec<Event>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        device.subscribe_all(move |_, event| sink.lock().unwrap().push(event.clone()));
        seen
    }

    #[test]
    fn test_new_device_is_not_ready() {
        let device = device();
        assert!(!device.is_ready());
        assert_eq!(device.state().channels().count(), 0);
        assert_eq!(device.config().inbound_policy, InboundPolicy::Permissive);
    }

    #[test]
    fn test_attach_detach_lifecycle_events() {
        let mut device = device();
        let seen = record_events(&mut device);

        device.attach();
        device.attach();
        device.detach();
        device.detach();

        assert_eq!(*seen.lock().unwrap(), vec![Event::Opened, Event::Closed]);
        assert!(!device.is_ready());
    }

    #[test]
    fn test_closed_handler_sees_ready_device_state() {
        let mut device = device();
        device.attach();
        device.handle("Level", Some(0), "3");

        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        device.subscribe("closed", move |state, _| {
            *sink.lock().unwrap() = state.channel(0).and_then(|c| c.number("level"));
        });
        device.detach();

        assert_eq!(*observed.lock().unwrap(), Some(3.0));
        assert_eq!(device.state().channel(0).unwrap().number("level"), Some(3.0));
    }

    #[test]
    fn test_updates_before_ready_apply_silently() {
        let mut device = device();
        let seen = record_events(&mut device);

        device.handle("Level", Some(1), "5");
        assert_eq!(device.state().channel(1).unwrap().number("level"), Some(5.0));
        assert!(seen.lock().unwrap().is_empty());

        device.attach();
        device.handle("Level", Some(1), "6");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].change().unwrap().value, Value::Number(6.0));
    }

    #[test]
    fn test_unknown_keyword_produces_nothing() {
        let mut device = device();
        let seen = record_events(&mut device);
        device.attach();

        let outcome = device.handle_update(&UpdateMessage::indexed("Future", 0, "1"));
        assert_eq!(outcome, ApplyOutcome::Ignored(IgnoreReason::UnknownKeyword));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_strict_device_drops_malformed() {
        let config = DeviceConfig::named("strict").with_inbound_policy(InboundPolicy::Strict);
        let mut device = Device::with_config(&REGISTRY, RecordingTransport::new(), config);
        let seen = record_events(&mut device);
        device.attach();

        let outcome = device.handle("Supply", None, "bogus");
        assert!(outcome.is_ignored());
        assert!(device.state().scalar("supply").is_none());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_set_change_trigger_writes_and_sends() {
        let mut device = device();
        device.attach();

        device
            .set_change_trigger("LevelChangeTrigger", [0, 2], 1.5)
            .unwrap()
            .set_change_trigger("LevelChangeTrigger", 1, "0.25")
            .unwrap();

        for (index, expected) in [(0, 1.5), (1, 0.25), (2, 1.5)] {
            let channel = device.state().channel(index).unwrap();
            assert_eq!(channel.number("levelChangeTrigger"), Some(expected));
        }

        let sent: Vec<_> = device.transport().sent().iter().map(ToString::to_string).collect();
        assert_eq!(
            sent,
            vec![
                "LevelChangeTrigger/0=1.5",
                "LevelChangeTrigger/2=1.5",
                "LevelChangeTrigger/1=0.25",
            ]
        );
    }

    #[test]
    fn test_invalid_change_trigger_leaves_state_unchanged() {
        let mut device = device();
        device.attach();
        device.set_change_trigger("LevelChangeTrigger", 0, 2.0).unwrap();
        device.transport_mut().clear();

        let error = device
            .set_change_trigger("LevelChangeTrigger", [0, 1], -1.0)
            .unwrap_err();
        assert!(error.is_validation());
        assert_eq!(
            device.state().channel(0).unwrap().number("levelChangeTrigger"),
            Some(2.0)
        );
        assert!(device.state().channel(1).is_none());
        assert!(device.transport().sent().is_empty());
    }

    #[test]
    fn test_set_enumerated_normalizes() {
        let mut device = device();
        device.attach();
        device.set_enumerated("Mode", [0, 1], "fast").unwrap();

        assert_eq!(device.state().channel(0).unwrap().code("mode"), Some(1));
        assert_eq!(device.state().channel(1).unwrap().code("mode"), Some(1));
        assert!(device.transport().sent().iter().all(|c| c.value == "1"));
    }

    #[test]
    fn test_set_enumerated_rejects_unknown_alias() {
        let mut device = device();
        device.attach();
        device.set_enumerated("Mode", 0, "slow").unwrap();

        assert!(device.set_enumerated("Mode", 0, "turbo").is_err());
        assert_eq!(device.state().channel(0).unwrap().code("mode"), Some(0));
        assert_eq!(device.transport().sent().len(), 1);
    }

    #[test]
    fn test_commands_while_not_ready_are_no_ops() {
        let mut device = device();

        device.set_change_trigger("LevelChangeTrigger", 0, -5.0).unwrap();
        device.set_enumerated("Mode", 0, "turbo").unwrap();

        assert_eq!(device.state().channels().count(), 0);
        assert!(device.transport().sent().is_empty());
    }

    #[test]
    fn test_command_on_wrong_keyword() {
        let mut device = device();
        device.attach();

        let result = device.set_enumerated("Level", 0, "fast");
        assert!(matches!(result, Err(Error::NotWritable { .. })));
        let result = device.set_change_trigger("Nope", 0, 1.0);
        assert!(matches!(result, Err(Error::UnknownKeyword(_))));
    }

    #[test]
    fn test_command_writes_emit_no_event() {
        let mut device = device();
        device.attach();
        let seen = record_events(&mut device);

        device.set_change_trigger("LevelChangeTrigger", 0, 1.0).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_reflects_readiness() {
        let mut device = device();
        device.handle("Supply", None, "5");
        assert!(!device.snapshot().ready);

        device.attach();
        let snapshot = device.snapshot();
        assert!(snapshot.ready);
        assert_eq!(snapshot.scalars.get("supply"), Some(&Value::Number(5.0)));
    }
}
