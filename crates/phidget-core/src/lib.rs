//! Shared vocabulary for the device-state synchronization workspace.
//!
//! Every other crate builds on the types defined here: the error taxonomy,
//! attribute [`Value`]s, channel addressing ([`ChannelIndex`], [`IndexSet`])
//! and the device configuration.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{DeviceConfig, InboundPolicy, ManagerConfig};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
