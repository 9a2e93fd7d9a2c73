//! edgefilter-core - Core types for the edgefilter module
//!
//! This crate provides the types shared between the filter module and the
//! transports that carry its messages:
//!
//! - [`Message`] - telemetry envelope (zero-copy body, properties, system metadata)
//! - [`PendingSend`] - an owned in-flight send with exactly-once completion
//! - [`Transport`] trait - enqueue sends to named outputs, report outcomes
//! - [`TransportError`] - error type for transport operations
//! - [`property_keys`] - reserved property names and metadata defaults
//!
//! # Why this crate exists
//!
//! Transport implementations (MQTT, AMQP, local test doubles) only need the
//! message and pending-send types. Keeping them here lets a transport crate
//! depend on `edgefilter-core` without pulling in the module itself:
//!
//! ```text
//! edgefilter-core ◄── edgefilter-gateway ◄── edgefilter-runtime
//!        ▲
//!        └─────────── external transports
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

mod error;
/// The message envelope
pub mod message;
/// In-flight sends and their completion
pub mod pending;
/// Reserved property names and system metadata defaults
pub mod property_keys;
mod transport;

pub use error::TransportError;
pub use message::{Body, Message, Properties};
pub use pending::{CompletionCallback, Confirmation, PendingSend, Rejected};
pub use transport::{Transport, reject};
