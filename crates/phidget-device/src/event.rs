//! Change events and the subscription registry.
//!
//! The dispatcher decides per applied update whether an event is emitted:
//! only when the device is ready and the keyword is emittable. Lifecycle
//! events (`opened`, `closed`) go through the same registry.
//!
//! Handlers run synchronously, in subscription order, after the state
//! mutation that caused the event, and see the state as it is after the
//! update.

use crate::state::{AppliedUpdate, DeviceState};
use phidget_core::{ChannelIndex, Value};
use serde::Serialize;
use std::fmt;
use tracing::trace;

/// Event name of the lifecycle event fired after attach.
pub const OPENED: &str = "opened";

/// Event name of the lifecycle event fired before detach.
pub const CLOSED: &str = "closed";

/// Payload of a change event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    /// camelCase event name, e.g. `"temperature"`.
    pub name: &'static str,

    /// Wire keyword that produced the change.
    pub keyword: &'static str,

    /// Present for channel-indexed keywords.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<ChannelIndex>,

    pub value: Value,
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The device became ready.
    Opened,

    /// The device is about to stop being ready.
    Closed,

    /// An emittable attribute was updated.
    Changed(Change),
}

impl Event {
    /// Name subscribers filter on.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opened => OPENED,
            Self::Closed => CLOSED,
            Self::Changed(change) => change.name,
        }
    }

    #[must_use]
    pub fn change(&self) -> Option<&Change> {
        match self {
            Self::Changed(change) => Some(change),
            _ => None,
        }
    }
}

/// Identifies a subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Boxed subscriber callback.
pub type Handler = Box<dyn Fn(&DeviceState, &Event) + Send + 'static>;

struct Subscription {
    id: SubscriptionId,
    /// `None` receives every event.
    name: Option<String>,
    handler: Handler,
}

impl Subscription {
    fn wants(&self, event: &Event) -> bool {
        self.name.as_deref().is_none_or(|name| name == event.name())
    }
}

/// Decides what to emit and delivers it to subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events with the given name.
    pub fn subscribe<F>(&mut self, name: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&DeviceState, &Event) + Send + 'static,
    {
        self.insert(Some(name.into()), Box::new(handler))
    }

    /// Subscribe to every event.
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&DeviceState, &Event) + Send + 'static,
    {
        self.insert(None, Box::new(handler))
    }

    fn insert(&mut self, name: Option<String>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, name, handler });
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Event for an applied update, if one should be emitted.
    #[must_use]
    pub fn decide(update: &AppliedUpdate, ready: bool) -> Option<Event> {
        let descriptor = update.descriptor();
        if !ready || !descriptor.is_emittable() {
            return None;
        }

        Some(Event::Changed(Change {
            name: descriptor.field(),
            keyword: descriptor.keyword(),
            index: update.index(),
            value: update.value().clone(),
        }))
    }

    /// Decide and publish in one step. Returns the emitted event.
    pub fn dispatch(
        &self,
        state: &DeviceState,
        update: &AppliedUpdate,
        ready: bool,
    ) -> Option<Event> {
        let event = Self::decide(update, ready)?;
        self.publish(state, &event);
        Some(event)
    }

    /// Deliver an event to every matching subscriber.
    pub fn publish(&self, state: &DeviceState, event: &Event) {
        trace!(event = event.name(), "Publishing event");
        for subscription in self.subscriptions.iter().filter(|s| s.wants(event)) {
            (subscription.handler)(state, event);
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriptions", &self.subscriptions.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
