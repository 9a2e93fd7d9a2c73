//! Transports shipped with the module
//!
//! Network transports live outside this crate and implement
//! [`edgefilter_core::Transport`] directly. The one here is for local runs
//! and debugging.

pub mod stdout;

pub use edgefilter_core::{Transport, TransportError};
pub use stdout::StdoutTransport;
