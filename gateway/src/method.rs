//! Direct method handler
//!
//! The only method with behavior is `heartbeat`, which emits a status
//! message on the heartbeat output. Every other name is acknowledged.

use crate::metrics::Metrics;
use crate::tracker::{SendTracker, SubmissionOutcome};
use bytes::Bytes;
use edgefilter_core::Message;
use std::sync::Arc;
use tracing::{info, warn};

/// Method that emits a liveness message
pub const HEARTBEAT_METHOD: &str = "heartbeat";

/// Status for a handled method
pub const STATUS_OK: i32 = 200;

/// Status when the heartbeat could not be submitted
pub const STATUS_FAILED: i32 = -1;

const RESPONSE_COMPLETE: &[u8] = br#"{"Response":"Complete"}"#;
const RESPONSE_FAILED: &[u8] = b"{ }";

/// Status code and JSON body returned to the invoker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResponse {
    /// Method status code
    pub status: i32,
    /// Response body, owned by the caller
    pub body: Bytes,
}

impl MethodResponse {
    /// `200` with `{"Response":"Complete"}`
    pub fn complete() -> Self {
        Self {
            status: STATUS_OK,
            body: Bytes::from_static(RESPONSE_COMPLETE),
        }
    }

    /// `-1` with `{ }`
    pub fn failed() -> Self {
        Self {
            status: STATUS_FAILED,
            body: Bytes::from_static(RESPONSE_FAILED),
        }
    }
}

/// Serves direct method invocations
pub struct MethodHandler {
    tracker: Arc<SendTracker>,
    module_id: String,
    heartbeat_output: String,
}

impl MethodHandler {
    /// Create a handler that reports as `module_id`
    pub fn new(
        tracker: Arc<SendTracker>,
        module_id: impl Into<String>,
        heartbeat_output: impl Into<String>,
    ) -> Self {
        Self {
            tracker,
            module_id: module_id.into(),
            heartbeat_output: heartbeat_output.into(),
        }
    }

    /// Handle a method invocation
    ///
    /// The payload is not inspected.
    pub fn on_method_invoked(&self, method: &str, payload: &[u8]) -> MethodResponse {
        info!(method, payload_len = payload.len(), "Method invoked");

        let response = if method == HEARTBEAT_METHOD {
            self.heartbeat()
        } else {
            MethodResponse::complete()
        };

        if let Some(metrics) = Metrics::get() {
            metrics.record_method(method_label(method), response.status);
        }
        response
    }

    fn heartbeat(&self) -> MethodResponse {
        let sequence_id = self.tracker.next_sequence();
        let status = Message::from_text(self.status_text());

        match self
            .tracker
            .submit(status, &self.heartbeat_output, sequence_id, |_, _| {})
        {
            SubmissionOutcome::Accepted => MethodResponse::complete(),
            SubmissionOutcome::Rejected => {
                warn!(
                    sequence_id,
                    output = %self.heartbeat_output,
                    "Heartbeat submission failed"
                );
                MethodResponse::failed()
            }
        }
    }

    /// Body of the heartbeat message
    pub fn status_text(&self) -> String {
        format!("Module [{}] is Running", self.module_id)
    }
}

/// Metric label for `method`; unknown names share one series
fn method_label(method: &str) -> &str {
    if method == HEARTBEAT_METHOD {
        method
    } else {
        "other"
    }
}
