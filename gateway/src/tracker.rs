//! Pending-send tracker
//!
//! Wraps every outbound message in a [`PendingSend`], hands it to the
//! transport, and keeps count of sends still waiting for their completion.
//! Also owns the process-wide sequence counter used to tag log lines.
//!
//! # Lifecycle
//!
//! ```text
//! submit ─► in_flight += 1 ─► transport.send_event_to_output
//!                                 │
//!                 ┌───────────────┴───────────────┐
//!                 ▼ Ok                            ▼ Err(Rejected)
//!            Accepted                        in_flight -= 1
//!                 │                          message released
//!       (later, any thread)                  Rejected, no callback
//!        complete(result)
//!                 │
//!        in_flight -= 1, log, caller's on_complete, message released
//! ```

use crate::metrics::Metrics;
use edgefilter_core::{Confirmation, Message, PendingSend, Rejected, Transport};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Result of handing a message to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The transport owns the send and will complete it
    Accepted,
    /// The transport refused the send; the message has been released
    Rejected,
}

/// Submits owned messages to the transport and tracks their completion
pub struct SendTracker {
    transport: Arc<dyn Transport>,
    /// Process-wide sequence counter (diagnostics only)
    sequence: AtomicU64,
    /// Accepted sends not yet completed
    in_flight: Arc<AtomicUsize>,
}

impl SendTracker {
    /// Create a tracker sending through `transport`
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            sequence: AtomicU64::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Take the next sequence id
    ///
    /// Atomic, so concurrent ingestion never hands out the same id twice.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends accepted by the transport and not yet completed
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The underlying transport
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Hand `message` to the transport for `output`
    ///
    /// On `Accepted` the message is owned by the transport until it
    /// completes the send; `on_complete` then runs exactly once with the
    /// sequence id and outcome. On `Rejected` the message is released here
    /// and `on_complete` never runs.
    pub fn submit(
        &self,
        message: Message,
        output: &str,
        sequence_id: u64,
        on_complete: impl FnOnce(u64, Confirmation) + Send + 'static,
    ) -> SubmissionOutcome {
        let in_flight = Arc::clone(&self.in_flight);
        let output_name = output.to_string();

        // Count before handing off: the completion may run on another
        // thread before send_event_to_output returns.
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        if let Some(metrics) = Metrics::get() {
            metrics.record_send_started();
        }

        let pending = PendingSend::new(message, output, sequence_id, move |seq, result| {
            in_flight.fetch_sub(1, Ordering::AcqRel);
            if result.is_success() {
                info!(sequence_id = seq, output = %output_name, %result, "Confirmation received");
            } else {
                warn!(sequence_id = seq, output = %output_name, %result, "Confirmation received");
            }
            if let Some(metrics) = Metrics::get() {
                metrics.record_confirmation(&output_name, result.as_str());
            }
            on_complete(seq, result);
        });

        match self.transport.send_event_to_output(pending) {
            Ok(()) => {
                debug!(sequence_id, output, transport = self.transport.name(), "Send accepted");
                if let Some(metrics) = Metrics::get() {
                    metrics.record_forwarded(output);
                }
                SubmissionOutcome::Accepted
            }
            Err(Rejected { pending, reason }) => {
                self.in_flight.fetch_sub(1, Ordering::AcqRel);
                if let Some(metrics) = Metrics::get() {
                    metrics.record_send_rejected();
                    metrics.record_dropped("rejected");
                }
                warn!(
                    sequence_id,
                    output,
                    transport = self.transport.name(),
                    error = %reason,
                    "send_event_to_output failed"
                );
                drop(pending.abandon());
                SubmissionOutcome::Rejected
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use edgefilter_core::TransportError;
    use parking_lot::Mutex;

    /// Transport that queues sends until the test completes them
    struct ManualTransport {
        queue: Mutex<Vec<PendingSend>>,
        refuse: bool,
    }

    impl ManualTransport {
        fn accepting() -> Arc<Self> {
            Arc::new(Self {
                queue: Mutex::new(Vec::new()),
                refuse: false,
            })
        }

        fn refusing() -> Arc<Self> {
            Arc::new(Self {
                queue: Mutex::new(Vec::new()),
                refuse: true,
            })
        }

        fn complete_all(&self, result: Confirmation) {
            let drained: Vec<_> = self.queue.lock().drain(..).collect();
            for pending in drained {
                pending.complete(result);
            }
        }
    }

    impl Transport for ManualTransport {
        fn name(&self) -> &'static str {
            "manual"
        }

        fn send_event_to_output(&self, pending: PendingSend) -> Result<(), Rejected> {
            if self.refuse {
                return edgefilter_core::reject(pending, TransportError::NotReady);
            }
            self.queue.lock().push(pending);
            Ok(())
        }
    }

    /// Byte owner that counts how many times it is dropped
    struct DropCounter(Arc<AtomicUsize>);

    impl AsRef<[u8]> for DropCounter {
        fn as_ref(&self) -> &[u8] {
            b"{}"
        }
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counted_message() -> (Message, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        let body = Bytes::from_owner(DropCounter(Arc::clone(&drops)));
        (Message::from_bytes(body), drops)
    }

    fn recorder() -> (
        Arc<Mutex<Vec<(u64, Confirmation)>>>,
        impl FnOnce(u64, Confirmation) + Send + 'static,
    ) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |seq, result| sink.lock().push((seq, result)))
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let tracker = SendTracker::new(ManualTransport::accepting());
        assert_eq!(tracker.next_sequence(), 0);
        assert_eq!(tracker.next_sequence(), 1);
        assert_eq!(tracker.next_sequence(), 2);
    }

    #[test]
    fn test_accepted_send_completes_exactly_once() {
        let transport = ManualTransport::accepting();
        let tracker = SendTracker::new(transport.clone());
        let (calls, on_complete) = recorder();

        let outcome = tracker.submit(Message::from_bytes("{}"), "output1", 4, on_complete);

        assert_eq!(outcome, SubmissionOutcome::Accepted);
        assert_eq!(tracker.in_flight(), 1);
        assert!(calls.lock().is_empty());

        transport.complete_all(Confirmation::Ok);
        transport.complete_all(Confirmation::Ok);

        assert_eq!(*calls.lock(), vec![(4, Confirmation::Ok)]);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn test_failed_delivery_still_completes() {
        let transport = ManualTransport::accepting();
        let tracker = SendTracker::new(transport.clone());
        let (calls, on_complete) = recorder();

        tracker.submit(Message::from_bytes("{}"), "output1", 0, on_complete);
        transport.complete_all(Confirmation::Error);

        assert_eq!(*calls.lock(), vec![(0, Confirmation::Error)]);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn test_message_released_only_after_completion() {
        let transport = ManualTransport::accepting();
        let tracker = SendTracker::new(transport.clone());
        let (message, drops) = counted_message();

        tracker.submit(message, "output1", 0, |_, _| {});
        assert_eq!(drops.load(Ordering::SeqCst), 0, "released before completion");

        transport.complete_all(Confirmation::Ok);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejected_send_released_without_callback() {
        let tracker = SendTracker::new(ManualTransport::refusing());
        let (calls, on_complete) = recorder();
        let (message, drops) = counted_message();

        let outcome = tracker.submit(message, "output1", 0, on_complete);

        assert_eq!(outcome, SubmissionOutcome::Rejected);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(calls.lock().is_empty());
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn test_transport_teardown_reports_destroyed() {
        let transport = ManualTransport::accepting();
        let tracker = SendTracker::new(transport.clone());
        let (calls, on_complete) = recorder();

        tracker.submit(Message::from_bytes("{}"), "output1", 11, on_complete);
        transport.queue.lock().clear();

        assert_eq!(*calls.lock(), vec![(11, Confirmation::Destroyed)]);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn test_completion_from_worker_thread() {
        let transport = ManualTransport::accepting();
        let tracker = SendTracker::new(transport.clone());
        let (calls, _) = recorder();

        for seq in 0..8 {
            let calls = Arc::clone(&calls);
            tracker.submit(Message::from_bytes("{}"), "output1", seq, move |seq, result| {
                calls.lock().push((seq, result));
            });
        }
        assert_eq!(tracker.in_flight(), 8);

        let worker = {
            let transport = Arc::clone(&transport);
            std::thread::spawn(move || transport.complete_all(Confirmation::Ok))
        };
        worker.join().unwrap();

        let mut seen: Vec<u64> = calls.lock().iter().map(|(seq, _)| *seq).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert_eq!(tracker.in_flight(), 0);
    }
}
