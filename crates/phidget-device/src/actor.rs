//! Per-device actor.
//!
//! A [`DeviceActor`] owns one [`Device`] and is its single writer. Callers
//! talk to it through a cloneable [`DeviceHandle`]; requests are processed
//! strictly in arrival order.
//!
//! ```text
//! ┌──────────────┐  DeviceRequest  ┌─────────────┐
//! │ DeviceHandle │────────────────►│ DeviceActor │──► Device
//! │ (clone)      │     (mpsc)      │ (task)      │
//! └──────────────┘                 └─────────────┘
//!        ▲                                │
//!        └──────── oneshot reply ─────────┘
//! ```

use crate::device::Device;
use crate::event::{Event, Handler, SubscriptionId};
use crate::state::{DeviceSnapshot, DeviceState};
use crate::transport::Transport;
use crate::validator::TriggerValue;
use phidget_core::{DeviceKey, Error, IndexSet, Result};
use phidget_protocol::{EnumInput, UpdateMessage};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

type Reply<T> = oneshot::Sender<T>;

/// Request processed by a [`DeviceActor`].
pub enum DeviceRequest {
    Update(UpdateMessage),
    Attach,
    Detach,
    SetChangeTrigger {
        keyword: String,
        indices: IndexSet,
        value: TriggerValue,
        reply: Reply<Result<()>>,
    },
    SetEnumerated {
        keyword: String,
        indices: IndexSet,
        value: EnumInput,
        reply: Reply<Result<()>>,
    },
    Subscribe {
        name: Option<String>,
        handler: Handler,
        reply: Reply<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: Reply<bool>,
    },
    Snapshot(Reply<DeviceSnapshot>),
}

impl std::fmt::Debug for DeviceRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update(update) => write!(f, "Update({update})"),
            Self::Attach => write!(f, "Attach"),
            Self::Detach => write!(f, "Detach"),
            Self::SetChangeTrigger { keyword, value, .. } => {
                write!(f, "SetChangeTrigger({keyword}={value})")
            }
            Self::SetEnumerated { keyword, value, .. } => {
                write!(f, "SetEnumerated({keyword}={value})")
            }
            Self::Subscribe { name, .. } => write!(f, "Subscribe({name:?})"),
            Self::Unsubscribe { id, .. } => write!(f, "Unsubscribe({id})"),
            Self::Snapshot(_) => write!(f, "Snapshot"),
        }
    }
}

/// Task owning one device.
pub struct DeviceActor<T> {
    key: DeviceKey,
    device: Device<T>,
    rx: mpsc::Receiver<DeviceRequest>,
}

impl<T: Transport> DeviceActor<T> {
    /// Create an actor and the handle that feeds it. The queue capacity comes
    /// from the device's configuration.
    pub fn new(key: DeviceKey, device: Device<T>) -> (Self, DeviceHandle) {
        let (tx, rx) = mpsc::channel(device.config().request_capacity.max(1));
        let handle = DeviceHandle {
            key: key.clone(),
            tx,
        };
        (Self { key, device, rx }, handle)
    }

    #[must_use]
    pub fn key(&self) -> &DeviceKey {
        &self.key
    }

    /// Process requests until every handle is dropped.
    ///
    /// # Errors
    /// Currently always returns `Ok`.
    pub async fn run(mut self) -> Result<()> {
        debug!(device = %self.key, "Device actor started");
        while let Some(request) = self.rx.recv().await {
            self.handle_request(request);
        }
        debug!(device = %self.key, "Device actor stopped");
        Ok(())
    }

    fn handle_request(&mut self, request: DeviceRequest) {
        match request {
            DeviceRequest::Update(update) => {
                self.device.handle_update(&update);
            }
            DeviceRequest::Attach => self.device.attach(),
            DeviceRequest::Detach => self.device.detach(),
            DeviceRequest::SetChangeTrigger {
                keyword,
                indices,
                value,
                reply,
            } => {
                let result = self
                    .device
                    .set_change_trigger(&keyword, indices, value)
                    .map(|_| ());
                let _ = reply.send(result);
            }
            DeviceRequest::SetEnumerated {
                keyword,
                indices,
                value,
                reply,
            } => {
                let result = self
                    .device
                    .set_enumerated(&keyword, indices, value)
                    .map(|_| ());
                let _ = reply.send(result);
            }
            DeviceRequest::Subscribe {
                name,
                handler,
                reply,
            } => {
                let id = match name {
                    Some(name) => self.device.subscribe(name, handler),
                    None => self.device.subscribe_all(handler),
                };
                let _ = reply.send(id);
            }
            DeviceRequest::Unsubscribe { id, reply } => {
                let _ = reply.send(self.device.unsubscribe(id));
            }
            DeviceRequest::Snapshot(reply) => {
                let _ = reply.send(self.device.snapshot());
            }
        }
    }
}

/// Cloneable handle to a running [`DeviceActor`].
///
/// Every method fails with `Error::ChannelClosed` once the actor has
/// stopped.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    key: DeviceKey,
    tx: mpsc::Sender<DeviceRequest>,
}

impl DeviceHandle {
    #[must_use]
    pub fn key(&self) -> &DeviceKey {
        &self.key
    }

    /// Whether the actor is still running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn send(&self, request: DeviceRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| Error::channel_closed(self.key.as_str()))
    }

    async fn request<R>(&self, build: impl FnOnce(Reply<R>) -> DeviceRequest) -> Result<R> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply)).await?;
        rx.await.map_err(|_| Error::channel_closed(self.key.as_str()))
    }

    /// Queue an inbound update.
    pub async fn update(&self, update: UpdateMessage) -> Result<()> {
        self.send(DeviceRequest::Update(update)).await
    }

    pub async fn attach(&self) -> Result<()> {
        self.send(DeviceRequest::Attach).await
    }

    pub async fn detach(&self) -> Result<()> {
        self.send(DeviceRequest::Detach).await
    }

    /// See [`Device::set_change_trigger`].
    pub async fn set_change_trigger(
        &self,
        keyword: impl Into<String>,
        indices: impl Into<IndexSet>,
        value: impl Into<TriggerValue>,
    ) -> Result<()> {
        let (keyword, indices, value) = (keyword.into(), indices.into(), value.into());
        self.request(|reply| DeviceRequest::SetChangeTrigger {
            keyword,
            indices,
            value,
            reply,
        })
        .await?
    }

    /// See [`Device::set_enumerated`].
    pub async fn set_enumerated(
        &self,
        keyword: impl Into<String>,
        indices: impl Into<IndexSet>,
        value: impl Into<EnumInput>,
    ) -> Result<()> {
        let (keyword, indices, value) = (keyword.into(), indices.into(), value.into());
        self.request(|reply| DeviceRequest::SetEnumerated {
            keyword,
            indices,
            value,
            reply,
        })
        .await?
    }

    pub async fn subscribe<F>(&self, name: impl Into<String>, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&DeviceState, &Event) + Send + 'static,
    {
        let name = Some(name.into());
        self.request(|reply| DeviceRequest::Subscribe {
            name,
            handler: Box::new(handler),
            reply,
        })
        .await
    }

    pub async fn subscribe_all<F>(&self, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&DeviceState, &Event) + Send + 'static,
    {
        self.request(|reply| DeviceRequest::Subscribe {
            name: None,
            handler: Box::new(handler),
            reply,
        })
        .await
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        self.request(|reply| DeviceRequest::Unsubscribe { id, reply })
            .await
    }

    /// Point-in-time copy of the device state, taken after every request
    /// queued before it.
    pub async fn snapshot(&self) -> Result<DeviceSnapshot> {
        self.request(DeviceRequest::Snapshot).await
    }
}
