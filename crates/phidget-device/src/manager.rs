//! Multi-device manager.
//!
//! The [`DeviceManager`] owns every attached device of one controller
//! connection. Each device runs in its own actor task; inbound updates are
//! routed to the owning actor by [`DeviceKey`], and every device's events are
//! aggregated into one unbounded stream. Events are never dropped; a caller
//! that stops reading lets them accumulate.
//!
//! ```text
//!                ┌──────────────┐
//! update ──────► │ ManagerHandle│──route──► DeviceActor (370123) ──┐
//!                │              │──route──► DeviceActor (370456) ──┤
//!                └──────────────┘                                  │
//!                       ▲      ▲                                   │
//!                       │      └──── AddressedCommand (mpsc) ◄─────┤
//!                       └─────────── ManagerEvent (mpsc) ◄─────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use phidget_core::{DeviceKey, ManagerConfig};
//! use phidget_device::{Device, DeviceManager};
//! use phidget_protocol::{KeywordDescriptor, KeywordRegistry, UpdateMessage};
//!
//! static KEYWORDS: [KeywordDescriptor; 1] =
//!     [KeywordDescriptor::channel("Level", "level").emittable()];
//! static REGISTRY: KeywordRegistry = KeywordRegistry::new("Example", &KEYWORDS);
//!
//! #[tokio::main]
//! async fn main() -> phidget_core::Result<()> {
//!     let mut manager = DeviceManager::new(ManagerConfig::default());
//!     let key = DeviceKey::from(370_123u32);
//!     let device = Device::new(&REGISTRY, manager.transport(key.clone()));
//!     manager.register(key.clone(), device)?;
//!
//!     let mut handle = manager.start();
//!     handle.device(&key)?.attach().await?;
//!     handle.route(&key, UpdateMessage::indexed("Level", 0, "1.5")).await?;
//!
//!     while let Some(event) = handle.recv().await {
//!         println!("{}: {}", event.device, event.event.name());
//!     }
//!
//!     handle.shutdown().await
//! }
//! ```

use crate::actor::{DeviceActor, DeviceHandle};
use crate::device::Device;
use crate::event::Event;
use crate::transport::{AddressedCommand, ChannelTransport};
use phidget_core::{DeviceKey, Error, ManagerConfig, Result};
use phidget_protocol::UpdateMessage;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Event from any managed device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerEvent {
    pub device: DeviceKey,
    pub event: Event,
}

/// Registers devices and starts their actors.
pub struct DeviceManager {
    config: ManagerConfig,
    devices: BTreeMap<DeviceKey, Device<ChannelTransport>>,
    event_tx: mpsc::UnboundedSender<ManagerEvent>,
    event_rx: mpsc::UnboundedReceiver<ManagerEvent>,
    outbound_tx: mpsc::Sender<AddressedCommand>,
    outbound_rx: mpsc::Receiver<AddressedCommand>,
}

impl DeviceManager {
    pub fn new(config: ManagerConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity.max(1));

        Self {
            config,
            devices: BTreeMap::new(),
            event_tx,
            event_rx,
            outbound_tx,
            outbound_rx,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Transport for a device about to be registered under `key`.
    #[must_use]
    pub fn transport(&self, key: DeviceKey) -> ChannelTransport {
        ChannelTransport::new(key, self.outbound_tx.clone())
    }

    /// Register a device.
    ///
    /// # Errors
    /// Returns `Error::DuplicateDevice` if the key is already registered.
    pub fn register(&mut self, key: DeviceKey, device: Device<ChannelTransport>) -> Result<()> {
        if self.devices.contains_key(&key) {
            return Err(Error::DuplicateDevice(key.to_string()));
        }
        debug!(device = %key, class = device.registry().device_class(), "Registered device");
        self.devices.insert(key, device);
        Ok(())
    }

    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Spawn one actor per registered device and return the handle.
    pub fn start(self) -> ManagerHandle {
        let mut tasks = JoinSet::new();
        let mut handles = BTreeMap::new();

        for (key, mut device) in self.devices {
            let tx = self.event_tx.clone();
            let source = key.clone();
            device.subscribe_all(move |_, event| {
                let event = ManagerEvent {
                    device: source.clone(),
                    event: event.clone(),
                };
                // Closed only after the handle is dropped.
                let _ = tx.send(event);
            });

            let (actor, handle) = DeviceActor::new(key.clone(), device);
            tasks.spawn(actor.run());
            handles.insert(key, handle);
        }

        info!(devices = handles.len(), "Device manager started");

        ManagerHandle {
            devices: handles,
            event_rx: self.event_rx,
            outbound_rx: self.outbound_rx,
            tasks,
        }
    }
}

/// Handle to running device actors.
pub struct ManagerHandle {
    devices: BTreeMap<DeviceKey, DeviceHandle>,
    event_rx: mpsc::UnboundedReceiver<ManagerEvent>,
    outbound_rx: mpsc::Receiver<AddressedCommand>,
    tasks: JoinSet<Result<()>>,
}

impl ManagerHandle {
    /// Handle of one device.
    ///
    /// # Errors
    /// Returns `Error::DeviceNotFound` for an unregistered key.
    pub fn device(&self, key: &DeviceKey) -> Result<&DeviceHandle> {
        self.devices
            .get(key)
            .ok_or_else(|| Error::DeviceNotFound(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &DeviceKey> {
        self.devices.keys()
    }

    /// Route an inbound update to the owning device.
    ///
    /// # Errors
    /// `DeviceNotFound` for an unregistered key, `ChannelClosed` if the
    /// device's actor has stopped.
    pub async fn route(&self, key: &DeviceKey, update: UpdateMessage) -> Result<()> {
        self.device(key)?.update(update).await
    }

    /// Next event from any device. `None` once every actor has stopped.
    pub async fn recv(&mut self) -> Option<ManagerEvent> {
        self.event_rx.recv().await
    }

    /// Event if one is queued, without waiting.
    pub fn try_recv(&mut self) -> Option<ManagerEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Next outbound command from any device.
    pub async fn next_command(&mut self) -> Option<AddressedCommand> {
        self.outbound_rx.recv().await
    }

    /// Outbound command if one is queued, without waiting.
    pub fn try_next_command(&mut self) -> Option<AddressedCommand> {
        self.outbound_rx.try_recv().ok()
    }

    /// Abort every actor and wait for them to terminate.
    ///
    /// # Errors
    /// Never fails; task errors and panics are logged.
    pub async fn shutdown(mut self) -> Result<()> {
        self.devices.clear();
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        if error_count + panic_count > 0 {
            warn!(error_count, panic_count, "Device actors terminated abnormally");
        }
        info!("Device manager stopped");
        Ok(())
    }
}

fn classify_task_result(
    result: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> TaskTermination {
    match result {
        Ok(Ok(())) => TaskTermination::Success,
        Ok(Err(_)) => TaskTermination::Error,
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(_) => TaskTermination::Panic,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    /// Expected during shutdown.
    Cancelled,
    Panic,
}
