//! Convenience re-exports for module authors.
//!
//! ```rust
//! use edgefilter_runtime::prelude::*;
//! ```

// Core types
pub use edgefilter_core::{Body, Confirmation, Message, PendingSend, Rejected};

// Module and handlers
pub use edgefilter_gateway::{
    ConfigurationHandler, FilterModule, FilterModuleBuilder, IngestPipeline, MethodHandler,
};

// Handler results
pub use edgefilter_gateway::{Disposition, MethodResponse, ThresholdUpdate, TwinUpdateState};

// Transports
pub use edgefilter_gateway::{StdoutTransport, Transport};

// Error types
pub use edgefilter_gateway::{FilterError, TransportError};

// Zero-copy payload
pub use bytes::Bytes;

// Runtime
pub use crate::RuntimeBuilder;
pub use crate::inbound::InboundEvent;
