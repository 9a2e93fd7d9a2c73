//! Prometheus metrics for the filter module

use crate::error::{FilterError, Result};
use parking_lot::Mutex;
use prometheus::{
    CounterVec, Encoder, Gauge, TextEncoder, register_counter_vec, register_gauge,
};
use std::sync::OnceLock;

/// Global metrics instance
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Serializes registration so concurrent `init` calls don't double-register
static INIT_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// All module metrics
pub struct Metrics {
    // ─────────────────────────────────────────────────────────────────────────
    // Message counters
    // ─────────────────────────────────────────────────────────────────────────
    /// Messages received (by input)
    pub messages_received: CounterVec,

    /// Alerts handed to the transport (by output)
    pub messages_forwarded: CounterVec,

    /// Messages not forwarded (by reason)
    pub messages_dropped: CounterVec,

    // ─────────────────────────────────────────────────────────────────────────
    // Send lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Completions reported by the transport (by output, result)
    pub send_confirmations: CounterVec,

    /// Accepted sends awaiting completion
    pub sends_in_flight: Gauge,

    // ─────────────────────────────────────────────────────────────────────────
    // Control plane
    // ─────────────────────────────────────────────────────────────────────────
    /// Current temperature threshold
    pub temperature_threshold: Gauge,

    /// Direct method invocations (by method, status)
    pub method_invocations: CounterVec,
}

impl Metrics {
    /// Initialize metrics (call once at startup)
    ///
    /// Returns error if metric registration fails.
    pub fn init() -> Result<&'static Metrics> {
        if let Some(metrics) = METRICS.get() {
            return Ok(metrics);
        }

        let _guard = INIT_LOCK.lock();
        if let Some(metrics) = METRICS.get() {
            return Ok(metrics);
        }

        let metrics = Metrics {
            messages_received: register_counter_vec!(
                "edgefilter_messages_received_total",
                "Total messages received",
                &["input"]
            )
            .map_err(|e| FilterError::Metrics(format!("messages_received: {e}")))?,

            messages_forwarded: register_counter_vec!(
                "edgefilter_messages_forwarded_total",
                "Total messages handed to the transport",
                &["output"]
            )
            .map_err(|e| FilterError::Metrics(format!("messages_forwarded: {e}")))?,

            messages_dropped: register_counter_vec!(
                "edgefilter_messages_dropped_total",
                "Total messages not forwarded",
                &["reason"]
            )
            .map_err(|e| FilterError::Metrics(format!("messages_dropped: {e}")))?,

            send_confirmations: register_counter_vec!(
                "edgefilter_send_confirmations_total",
                "Send completions reported by the transport",
                &["output", "result"]
            )
            .map_err(|e| FilterError::Metrics(format!("send_confirmations: {e}")))?,

            sends_in_flight: register_gauge!(
                "edgefilter_sends_in_flight",
                "Accepted sends awaiting completion"
            )
            .map_err(|e| FilterError::Metrics(format!("sends_in_flight: {e}")))?,

            temperature_threshold: register_gauge!(
                "edgefilter_temperature_threshold",
                "Current temperature threshold"
            )
            .map_err(|e| FilterError::Metrics(format!("temperature_threshold: {e}")))?,

            method_invocations: register_counter_vec!(
                "edgefilter_method_invocations_total",
                "Direct method invocations",
                &["method", "status"]
            )
            .map_err(|e| FilterError::Metrics(format!("method_invocations: {e}")))?,
        };

        // Set the metrics (only succeeds once)
        let _ = METRICS.set(metrics);

        METRICS
            .get()
            .ok_or_else(|| FilterError::Metrics("Failed to initialize metrics".to_string()))
    }

    /// Get the global metrics instance
    ///
    /// Returns None if metrics haven't been initialized yet.
    pub fn get() -> Option<&'static Metrics> {
        METRICS.get()
    }

    /// Record a received message
    pub fn record_received(&self, input: &str) {
        self.messages_received.with_label_values(&[input]).inc();
    }

    /// Record a send about to be handed to the transport
    pub fn record_send_started(&self) {
        self.sends_in_flight.inc();
    }

    /// Record a send the transport refused
    pub fn record_send_rejected(&self) {
        self.sends_in_flight.dec();
    }

    /// Record a message accepted by the transport
    pub fn record_forwarded(&self, output: &str) {
        self.messages_forwarded.with_label_values(&[output]).inc();
    }

    /// Record a dropped message
    pub fn record_dropped(&self, reason: &str) {
        self.messages_dropped.with_label_values(&[reason]).inc();
    }

    /// Record a send completion
    pub fn record_confirmation(&self, output: &str, result: &str) {
        self.send_confirmations
            .with_label_values(&[output, result])
            .inc();
        self.sends_in_flight.dec();
    }

    /// Update the threshold gauge
    pub fn set_threshold(&self, threshold: i64) {
        self.temperature_threshold.set(threshold as f64);
    }

    /// Record a method invocation
    pub fn record_method(&self, method: &str, status: i32) {
        let status = status.to_string();
        self.method_invocations
            .with_label_values(&[method, status.as_str()])
            .inc();
    }
}

/// Gather all metrics in Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let first = Metrics::init().unwrap() as *const Metrics;
        let second = Metrics::init().unwrap() as *const Metrics;
        assert_eq!(first, second);
        assert!(Metrics::get().is_some());
    }

    #[test]
    fn test_gather_contains_module_metrics() {
        let metrics = Metrics::init().unwrap();
        metrics.record_received("input1");
        metrics.record_dropped("below_threshold");
        metrics.record_method("heartbeat", 200);

        let text = gather();
        assert!(text.contains("edgefilter_messages_received_total"));
        assert!(text.contains("edgefilter_messages_dropped_total"));
        assert!(text.contains("edgefilter_method_invocations_total"));
    }

    #[test]
    fn test_threshold_gauge() {
        let metrics = Metrics::init().unwrap();
        metrics.set_threshold(-3);
        // Other tests may update the gauge concurrently; only check it is set
        assert!(gather().contains("edgefilter_temperature_threshold"));
    }
}
