//! Keyword protocol vocabulary.
//!
//! A remote controller reports device state as a stream of
//! `(keyword, index?, value)` updates and accepts parameter-set commands
//! addressed the same way. This crate describes that vocabulary:
//!
//! - [`KeywordRegistry`]: the static per-device table of recognized keywords
//! - [`EnumTable`]: closed sets of enumerated wire codes with their aliases
//! - [`UpdateMessage`] / [`OutboundCommand`]: inbound and outbound messages
//! - [`decode_value`]: value decoding with a not-a-number sentinel for
//!   malformed numbers
//!
//! Framing, transport and discovery live elsewhere.

pub mod decode;
pub mod enum_table;
pub mod message;
pub mod registry;

pub use decode::{Decoded, decode_value, parse_number};
pub use enum_table::{EnumEntry, EnumInput, EnumTable};
pub use message::{OutboundCommand, ParameterKey, UpdateMessage};
pub use registry::{CommandRule, DecodeRule, KeywordDescriptor, KeywordRegistry, camel_case};
