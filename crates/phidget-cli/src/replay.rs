//! Replay script parsing.
//!
//! One entry per line:
//!
//! ```text
//! # comment
//! TemperatureInputCount=4          inbound update, device-wide
//! Temperature/2=101.2              inbound update, channel 2
//! > ThermocoupleType/0,1=k         outbound command, channels 0 and 1
//! > TemperatureChangeTrigger/3=0.5
//! ```

use phidget_core::{ChannelIndex, Error, IndexSet, Result};
use phidget_device::DeviceHandle;
use phidget_protocol::{CommandRule, EnumInput, KeywordRegistry, UpdateMessage};

const COMMAND_PREFIX: char = '>';
const COMMENT_PREFIX: char = '#';

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayLine {
    Blank,
    Update(UpdateMessage),
    Command {
        keyword: String,
        indices: IndexSet,
        value: String,
    },
}

/// Parse one script line.
///
/// # Errors
/// Returns `Error::InvalidParameterKey` for lines without `=`, bad indices,
/// or commands that address no channel.
pub fn parse_line(line: &str) -> Result<ReplayLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
        return Ok(ReplayLine::Blank);
    }

    if let Some(command) = line.strip_prefix(COMMAND_PREFIX) {
        let (key, value) = split_assignment(command.trim())?;
        let (keyword, indices) = key.split_once('/').ok_or_else(|| {
            Error::InvalidParameterKey(format!("command '{key}' needs a channel index"))
        })?;
        let indices = indices
            .split(',')
            .map(|index| index.trim().parse::<ChannelIndex>())
            .collect::<std::result::Result<IndexSet, _>>()
            .map_err(|_| Error::InvalidParameterKey(format!("invalid channel list in '{key}'")))?;

        return Ok(ReplayLine::Command {
            keyword: keyword.trim().to_string(),
            indices,
            value: value.to_string(),
        });
    }

    let (key, value) = split_assignment(line)?;
    Ok(ReplayLine::Update(UpdateMessage::from_key_value(key, value)?))
}

fn split_assignment(line: &str) -> Result<(&str, &str)> {
    line.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
        .ok_or_else(|| Error::InvalidParameterKey(format!("expected Key=value, got '{line}'")))
}

/// Send a parsed command to a running device.
///
/// # Errors
/// `UnknownKeyword`/`NotWritable` if the registry has no command for the
/// keyword; otherwise whatever the device reports.
pub async fn send_command(
    device: &DeviceHandle,
    registry: &KeywordRegistry,
    keyword: &str,
    indices: IndexSet,
    value: &str,
) -> Result<()> {
    let descriptor = registry
        .lookup(keyword)
        .ok_or_else(|| Error::UnknownKeyword(keyword.to_string()))?;

    match descriptor.command_rule() {
        Some(CommandRule::ChangeTrigger) => {
            device.set_change_trigger(keyword, indices, value).await
        }
        Some(CommandRule::Enumerated) => {
            let input = value
                .parse::<i64>()
                .map(EnumInput::Code)
                .unwrap_or_else(|_| EnumInput::from(value));
            device.set_enumerated(keyword, indices, input).await
        }
        None => Err(Error::not_writable(keyword, "set")),
    }
}
