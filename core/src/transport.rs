//! Transport trait for edgefilter
//!
//! The [`Transport`] trait is the boundary to the module's message channel:
//! it accepts [`PendingSend`] records for named outputs and later reports
//! each one's outcome by completing it.

use crate::error::TransportError;
use crate::pending::{PendingSend, Rejected};
use async_trait::async_trait;

/// Transport trait - delivers messages to named outputs
///
/// # Implementation Requirements
///
/// - Transports must be `Send + Sync`; completions may be delivered from a
///   worker thread or task other than the one that submitted
/// - `send_event_to_output` only enqueues. It must not block on I/O
/// - Every accepted record must eventually be completed exactly once; a
///   record dropped unfinished completes itself as `Destroyed`
/// - A refused record goes back to the caller inside [`Rejected`] and is
///   never completed
///
/// # Example
///
/// ```ignore
/// use edgefilter_core::{Confirmation, PendingSend, Rejected, Transport};
/// use parking_lot::Mutex;
///
/// struct ImmediateTransport {
///     queue: Mutex<Vec<PendingSend>>,
/// }
///
/// impl Transport for ImmediateTransport {
///     fn name(&self) -> &'static str {
///         "immediate"
///     }
///
///     fn send_event_to_output(&self, pending: PendingSend) -> Result<(), Rejected> {
///         self.queue.lock().push(pending);
///         Ok(())
///     }
///
///     fn do_work(&self) {
///         for pending in self.queue.lock().drain(..) {
///             pending.complete(Confirmation::Ok);
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for identification and logging, e.g. "stdout", "mqtt"
    fn name(&self) -> &'static str;

    /// Enqueue a send for `pending.output()`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - the transport owns the record and will complete it
    /// * `Err(Rejected)` - the record is handed back, no completion will fire
    fn send_event_to_output(&self, pending: PendingSend) -> Result<(), Rejected>;

    /// Pump the transport once
    ///
    /// Called by the driver on every poll tick. Transports that deliver
    /// from their own worker can leave the default no-op.
    fn do_work(&self) {}

    /// Graceful shutdown
    ///
    /// Implementations should flush or complete every queued send and
    /// refuse new ones afterwards.
    async fn shutdown(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Reject `pending` with `reason`
///
/// Convenience for transport implementations.
pub fn reject(pending: PendingSend, reason: TransportError) -> Result<(), Rejected> {
    Err(Rejected::new(pending, reason))
}
