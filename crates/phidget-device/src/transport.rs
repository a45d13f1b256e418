//! Outbound transport seam.
//!
//! The device never talks to a socket. It hands validated commands to a
//! [`Transport`], which owns framing, delivery and acknowledgement.
//! Transmission is fire-and-forget and must not block the caller.

use phidget_core::DeviceKey;
use phidget_protocol::OutboundCommand;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// Sink for outbound set-commands.
pub trait Transport: Send {
    /// Queue a command for transmission. Must not block.
    fn transmit(&mut self, command: OutboundCommand);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn transmit(&mut self, command: OutboundCommand) {
        (**self).transmit(command);
    }
}

/// Command tagged with the device it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressedCommand {
    pub device: DeviceKey,
    pub command: OutboundCommand,
}

/// Transport forwarding commands into a shared mpsc queue.
///
/// Every device of a manager gets its own `ChannelTransport` over the same
/// queue; the transport layer drains it. A full or closed queue drops the
/// command.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    device: DeviceKey,
    tx: mpsc::Sender<AddressedCommand>,
}

impl ChannelTransport {
    pub fn new(device: DeviceKey, tx: mpsc::Sender<AddressedCommand>) -> Self {
        Self { device, tx }
    }

    #[must_use]
    pub fn device(&self) -> &DeviceKey {
        &self.device
    }
}

impl Transport for ChannelTransport {
    fn transmit(&mut self, command: OutboundCommand) {
        let addressed = AddressedCommand {
            device: self.device.clone(),
            command,
        };
        match self.tx.try_send(addressed) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(device = %self.device, command = %dropped.command, "Outbound queue full, dropping command");
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!(device = %self.device, command = %dropped.command, "Outbound queue closed, dropping command");
            }
        }
    }
}
