use crate::transport::Transport;
use phidget_protocol::OutboundCommand;

/// Transport that keeps outbound commands in memory.
///
/// # Examples
///
/// ```
/// use phidget_core::Value;
/// use phidget_device::mock::RecordingTransport;
/// use phidget_device::transport::Transport;
/// use phidget_protocol::{OutboundCommand, ParameterKey};
///
/// let mut transport = RecordingTransport::new();
/// transport.transmit(OutboundCommand::set(
///     ParameterKey::indexed("ThermocoupleType", 0),
///     &Value::Code(1),
/// ));
///
/// assert_eq!(transport.sent().len(), 1);
/// let sent = transport.take();
/// assert_eq!(sent[0].to_string(), "ThermocoupleType/0=1");
/// assert!(transport.sent().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Vec<OutboundCommand>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> &[OutboundCommand] {
        &self.sent
    }

    /// Drain the recorded commands.
    pub fn take(&mut self) -> Vec<OutboundCommand> {
        std::mem::take(&mut self.sent)
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Transport for RecordingTransport {
    fn transmit(&mut self, command: OutboundCommand) {
        self.sent.push(command);
    }
}
