//! Ingest pipeline
//!
//! Runs once per inbound message: read the threshold, evaluate, and hand any
//! alert to the send tracker. The returned [`Disposition`] only says whether
//! the module took responsibility for the message, not whether the alert was
//! delivered.

use crate::filter::{FilterResult, evaluate};
use crate::metrics::Metrics;
use crate::threshold::ThresholdStore;
use crate::tracker::{SendTracker, SubmissionOutcome};
use edgefilter_core::Message;
use std::sync::Arc;
use tracing::{debug, info};

/// Synchronous outcome for an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// An alert was accepted by the transport
    Accepted,
    /// Nothing was forwarded (dropped or rejected downstream)
    Abandoned,
}

/// Filters inbound messages and forwards alerts to one output
pub struct IngestPipeline {
    store: Arc<ThresholdStore>,
    tracker: Arc<SendTracker>,
    output: String,
}

impl IngestPipeline {
    /// Create a pipeline forwarding to `output`
    pub fn new(
        store: Arc<ThresholdStore>,
        tracker: Arc<SendTracker>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tracker,
            output: output.into(),
        }
    }

    /// Output channel alerts are sent to
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Handle one inbound message
    pub fn on_message_received(&self, message: &Message) -> Disposition {
        let sequence_id = self.tracker.next_sequence();
        info!(
            sequence_id,
            body = %message.body_for_log(),
            properties = message.properties().len(),
            "Received message"
        );

        let threshold = self.store.get();
        let alert = match evaluate(message, threshold) {
            FilterResult::Forwarded(alert) => alert,
            FilterResult::Dropped(reason) => {
                debug!(sequence_id, threshold, reason = reason.as_str(), "Message dropped");
                if let Some(metrics) = Metrics::get() {
                    metrics.record_dropped(reason.as_str());
                }
                return Disposition::Abandoned;
            }
        };

        info!(sequence_id, threshold, output = %self.output, "Sending message to next stage");
        match self.tracker.submit(alert, &self.output, sequence_id, |_, _| {}) {
            SubmissionOutcome::Accepted => Disposition::Accepted,
            SubmissionOutcome::Rejected => Disposition::Abandoned,
        }
    }
}
