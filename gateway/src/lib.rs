//! edgefilter - temperature filter module for edge message pipelines
//!
//! Receives telemetry on one input, forwards an enriched alert copy of every
//! reading whose `machine.temperature` exceeds a threshold, and lets the
//! threshold be changed at runtime through twin updates.
//!
//! # Architecture
//!
//! ```text
//!                     ┌────────────── FilterModule ──────────────┐
//!  input1 ──────────► │ IngestPipeline ──► filter::evaluate      │
//!                     │        │                                 │
//!  twin update ─────► │ ConfigurationHandler ──► ThresholdStore  │
//!                     │        │                                 │
//!  method ──────────► │ MethodHandler (heartbeat)                │
//!                     │        ▼                                 │
//!                     │   SendTracker ─────────────────────────► │ ──► Transport
//!                     └──────────────────────────────────────────┘
//! ```
//!
//! The transport is pluggable via [`edgefilter_core::Transport`]. Handlers
//! never return errors: every call ends in a [`Disposition`], a
//! [`ThresholdUpdate`] or a [`MethodResponse`].

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod method;
pub mod metrics;
pub mod metrics_server;
pub mod module;
pub mod pipeline;
pub mod threshold;
pub mod tracker;
pub mod transport;
pub mod twin;

pub use config::{Config, LogFormat};
pub use document::{Document, DocumentError};
pub use error::{FilterError, Result, TransportError};
pub use filter::{DropReason, FilterResult, evaluate};
pub use method::{HEARTBEAT_METHOD, MethodHandler, MethodResponse};
pub use metrics_server::MetricsServer;
pub use module::{FilterModule, FilterModuleBuilder};
pub use pipeline::{Disposition, IngestPipeline};
pub use threshold::{DEFAULT_TEMPERATURE_THRESHOLD, ThresholdStore};
pub use tracker::{SendTracker, SubmissionOutcome};
pub use transport::StdoutTransport;
pub use twin::{ConfigurationHandler, ThresholdUpdate, TwinUpdateState};

pub use edgefilter_core::{Confirmation, Message, PendingSend, Rejected, Transport};
