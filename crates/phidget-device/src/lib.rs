//! Device state synchronization.
//!
//! This crate keeps a local mirror of a remote controller's device state in
//! sync with a stream of keyword/value updates, validates outbound
//! set-commands, and notifies subscribers of changes.
//!
//! # Architecture
//!
//! ```text
//! transport ──► DeviceState::apply ──► EventDispatcher ──► subscribers
//!                      ▲
//!                      │ write-through
//! Device::set_* ──► validator ──► Transport::transmit
//! ```
//!
//! - [`state`]: scalar and per-channel attribute store
//! - [`event`]: change events and subscriptions
//! - [`validator`]: command validation and planning
//! - [`transport`]: outbound seam and the channel-backed transport
//! - [`device`]: the facade combining all of the above
//! - [`actor`], [`manager`]: one task per device, many devices per connection
//!
//! Device types plug in by declaring a static
//! [`KeywordRegistry`](phidget_protocol::KeywordRegistry).

pub mod actor;
pub mod device;
pub mod event;
pub mod manager;
pub mod mock;
pub mod state;
pub mod transport;
pub mod validator;

pub use actor::{DeviceActor, DeviceHandle, DeviceRequest};
pub use device::Device;
pub use event::{Change, Event, EventDispatcher, Handler, SubscriptionId};
pub use manager::{DeviceManager, ManagerEvent, ManagerHandle};
pub use state::{
    AppliedUpdate, ApplyOutcome, Channel, DeviceSnapshot, DeviceState, IgnoreReason,
};
pub use transport::{AddressedCommand, ChannelTransport, Transport};
pub use validator::{CommandPlan, TriggerValue};
