//! Replay a captured update stream through a thermocouple sensor.
//!
//! Reads `Key=value` lines (and `> Key/idx=value` commands) from a file or
//! stdin, feeds them to a sensor running under a device manager, and prints
//! every event and outbound command as one JSON object per line.

use anyhow::{Context, Result};
use clap::Parser;
use phidget_core::{DeviceConfig, DeviceKey, InboundPolicy, ManagerConfig};
use phidget_device::{DeviceManager, ManagerHandle};
use phidget_temperature::{TEMPERATURE_SENSOR, TemperatureSensor};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod replay;

use replay::ReplayLine;

/// Replay thermocouple sensor updates and print the resulting events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Script to replay (stdin if omitted)
    input: Option<PathBuf>,

    /// Device configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial number of the replayed device
    #[arg(short, long, default_value_t = 370_123)]
    serial: u32,

    /// Reject malformed inbound values instead of storing NaN
    #[arg(long)]
    strict: bool,

    /// Replay without attaching, so no events are emitted
    #[arg(long)]
    detached: bool,

    /// Print the final device snapshot
    #[arg(long)]
    snapshot: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load_config(&args).await?;
    let key = DeviceKey::from(args.serial);

    let mut manager = DeviceManager::new(ManagerConfig::default());
    let sensor = TemperatureSensor::with_config(manager.transport(key.clone()), config);
    manager.register(key.clone(), sensor.into_device())?;
    let mut handle = manager.start();

    if !args.detached {
        handle.device(&key)?.attach().await?;
    }

    let reader: Box<dyn AsyncBufRead + Unpin> = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut lines = reader.lines();
    let mut line_number = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        replay_line(&handle, &key, &line, line_number).await?;
        drain(&mut handle, &key).await?;
    }

    if args.snapshot {
        let snapshot = handle.device(&key)?.snapshot().await?;
        println!("{}", serde_json::to_string(&snapshot)?);
    }

    info!(lines = line_number, "Replay finished");
    handle.shutdown().await?;
    Ok(())
}

async fn replay_line(
    handle: &ManagerHandle,
    key: &DeviceKey,
    line: &str,
    line_number: usize,
) -> Result<()> {
    let device = handle.device(key)?;
    match replay::parse_line(line) {
        Ok(ReplayLine::Blank) => {}
        Ok(ReplayLine::Update(update)) => device.update(update).await?,
        Ok(ReplayLine::Command {
            keyword,
            indices,
            value,
        }) => {
            if let Err(e) =
                replay::send_command(device, &TEMPERATURE_SENSOR, &keyword, indices, &value).await
            {
                warn!(line = line_number, error = %e, "Command rejected");
                let rejected = serde_json::json!({
                    "type": "rejected",
                    "line": line_number,
                    "error": e.to_string(),
                });
                println!("{rejected}");
            }
        }
        Err(e) => warn!(line = line_number, error = %e, "Skipping unparsable line"),
    }
    Ok(())
}

/// Wait for the device to catch up, then print everything it produced.
async fn drain(handle: &mut ManagerHandle, key: &DeviceKey) -> Result<()> {
    handle.device(key)?.snapshot().await?;

    while let Some(event) = handle.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }
    while let Some(command) = handle.try_next_command() {
        println!("{}", serde_json::to_string(&command)?);
    }
    Ok(())
}

async fn load_config(args: &Args) -> Result<DeviceConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            DeviceConfig::from_json_str(&json)?
        }
        None => DeviceConfig::named(format!("thermocouple-{}", args.serial)),
    };
    if args.strict {
        config.inbound_policy = InboundPolicy::Strict;
    }
    Ok(config)
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
