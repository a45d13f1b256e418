//! Constants shared by the protocol and device crates.
//!
//! # Parameter Keys
//!
//! Outbound commands address a parameter by keyword, optionally followed by
//! a channel index:
//!
//! ```text
//! TemperatureChangeTrigger/0
//! ^^^^^^^^^^^^^^^^^^^^^^^^ ^
//! keyword                  channel index
//! ```
//!
//! ```
//! use phidget_core::constants::*;
//!
//! assert_eq!(KEY_SEPARATOR, '/');
//! assert!(DEFAULT_OUTBOUND_CAPACITY > 0);
//! ```

/// Separator between keyword and channel index in a parameter key.
pub const KEY_SEPARATOR: char = '/';

/// Default name given to a device when the configuration omits one.
pub const DEFAULT_DEVICE_NAME: &str = "device";

/// Default capacity of a device actor's request queue.
pub const DEFAULT_REQUEST_CAPACITY: usize = 32;

/// Default capacity of the manager's outbound command queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;
