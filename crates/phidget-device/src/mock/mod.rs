//! In-memory transport for tests and development.
//!
//! Records every outbound command so tests can assert on what would have
//! been sent to the controller.

pub mod transport;

pub use transport::RecordingTransport;
