//! The filter module
//!
//! Composes the three handlers over one threshold store and one send
//! tracker, and is what the driver registers against its triggers:
//!
//! ```text
//!  input1 ───────► IngestPipeline ──┐
//!  twin update ──► ConfigurationHandler ──► ThresholdStore
//!  method ───────► MethodHandler ───┤
//!                                   ▼
//!                             SendTracker ──► Transport
//! ```
//!
//! # Example
//!
//! ```ignore
//! use edgefilter_gateway::{FilterModule, StdoutTransport};
//! use std::sync::Arc;
//!
//! let module = FilterModule::builder(Arc::new(StdoutTransport::new()))
//!     .threshold(30)
//!     .build();
//! ```

use crate::error::Result;
use crate::method::{MethodHandler, MethodResponse};
use crate::metrics::Metrics;
use crate::pipeline::{Disposition, IngestPipeline};
use crate::threshold::{DEFAULT_TEMPERATURE_THRESHOLD, ThresholdStore};
use crate::tracker::SendTracker;
use crate::twin::{ConfigurationHandler, ThresholdUpdate, TwinUpdateState};
use edgefilter_core::{Message, Transport};
use std::sync::Arc;
use tracing::{info, warn};

/// Builder for [`FilterModule`]
pub struct FilterModuleBuilder {
    transport: Arc<dyn Transport>,
    module_id: String,
    input: String,
    output: String,
    heartbeat_output: String,
    threshold: i64,
}

impl FilterModuleBuilder {
    /// Name reported in heartbeat messages
    ///
    /// Default is `FilterModule`.
    pub fn module_id(mut self, id: impl Into<String>) -> Self {
        self.module_id = id.into();
        self
    }

    /// Input carrying telemetry
    ///
    /// Default is `input1`. Messages on any other input are abandoned.
    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.input = name.into();
        self
    }

    /// Output receiving alerts
    ///
    /// Default is `output1`.
    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.output = name.into();
        self
    }

    /// Output receiving heartbeat messages
    ///
    /// Default is `heartbeat`.
    pub fn heartbeat_output(mut self, name: impl Into<String>) -> Self {
        self.heartbeat_output = name.into();
        self
    }

    /// Initial temperature threshold
    ///
    /// Default is 25.
    pub fn threshold(mut self, threshold: i64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Wire the handlers together
    pub fn build(self) -> FilterModule {
        let store = Arc::new(ThresholdStore::new(self.threshold));
        let tracker = Arc::new(SendTracker::new(self.transport));

        if let Some(metrics) = Metrics::get() {
            metrics.set_threshold(self.threshold);
        }

        FilterModule {
            pipeline: IngestPipeline::new(Arc::clone(&store), Arc::clone(&tracker), self.output),
            configuration: ConfigurationHandler::new(Arc::clone(&store)),
            methods: MethodHandler::new(
                Arc::clone(&tracker),
                self.module_id.clone(),
                self.heartbeat_output,
            ),
            module_id: self.module_id,
            input: self.input,
            store,
            tracker,
        }
    }
}

/// Edge filter module: filtering, configuration and liveness over one transport
pub struct FilterModule {
    module_id: String,
    input: String,
    store: Arc<ThresholdStore>,
    tracker: Arc<SendTracker>,
    pipeline: IngestPipeline,
    configuration: ConfigurationHandler,
    methods: MethodHandler,
}

impl FilterModule {
    /// Start building a module that sends through `transport`
    pub fn builder(transport: Arc<dyn Transport>) -> FilterModuleBuilder {
        FilterModuleBuilder {
            transport,
            module_id: "FilterModule".to_string(),
            input: "input1".to_string(),
            output: "output1".to_string(),
            heartbeat_output: "heartbeat".to_string(),
            threshold: DEFAULT_TEMPERATURE_THRESHOLD,
        }
    }

    /// Module name
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// Input this module filters
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Current temperature threshold
    pub fn threshold(&self) -> i64 {
        self.store.get()
    }

    /// Shared threshold store
    pub fn store(&self) -> &Arc<ThresholdStore> {
        &self.store
    }

    /// Sends accepted by the transport and not yet completed
    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight()
    }

    /// The ingest pipeline
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.pipeline
    }

    /// The configuration handler
    pub fn configuration(&self) -> &ConfigurationHandler {
        &self.configuration
    }

    /// The method handler
    pub fn methods(&self) -> &MethodHandler {
        &self.methods
    }

    /// Message arrived on `input`
    pub fn on_input_message(&self, input: &str, message: &Message) -> Disposition {
        let known = input == self.input;
        if let Some(metrics) = Metrics::get() {
            metrics.record_received(if known { input } else { "unknown" });
        }

        if !known {
            warn!(input, expected = %self.input, "Message on unknown input");
            if let Some(metrics) = Metrics::get() {
                metrics.record_dropped("unknown_input");
            }
            return Disposition::Abandoned;
        }

        self.pipeline.on_message_received(message)
    }

    /// Twin update arrived
    pub fn on_twin_update(&self, state: TwinUpdateState, payload: &[u8]) -> ThresholdUpdate {
        self.configuration.on_configuration_update(state, payload)
    }

    /// Direct method invoked
    pub fn on_method(&self, method: &str, payload: &[u8]) -> MethodResponse {
        self.methods.on_method_invoked(method, payload)
    }

    /// Pump the transport once
    pub fn do_work(&self) {
        self.tracker.transport().do_work();
    }

    /// Shut the transport down, completing whatever it still holds
    pub async fn shutdown(&self) -> Result<()> {
        let transport = self.tracker.transport();
        info!(
            transport = transport.name(),
            in_flight = self.tracker.in_flight(),
            "Shutting down transport"
        );
        transport.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edgefilter_core::{Confirmation, PendingSend, Rejected, TransportError};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct QueueTransport {
        queue: Mutex<Vec<PendingSend>>,
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for QueueTransport {
        fn name(&self) -> &'static str {
            "queue"
        }

        fn send_event_to_output(&self, pending: PendingSend) -> std::result::Result<(), Rejected> {
            self.queue.lock().push(pending);
            Ok(())
        }

        fn do_work(&self) {
            let drained: Vec<_> = self.queue.lock().drain(..).collect();
            for pending in drained {
                self.delivered.lock().push(pending.output().to_string());
                pending.complete(Confirmation::Ok);
            }
        }

        async fn shutdown(&self) -> std::result::Result<(), TransportError> {
            self.do_work();
            Ok(())
        }
    }

    fn module() -> (FilterModule, Arc<QueueTransport>) {
        let transport = Arc::new(QueueTransport::default());
        (FilterModule::builder(transport.clone()).build(), transport)
    }

    fn reading(temperature: i64) -> Message {
        Message::from_bytes(format!(r#"{{"machine":{{"temperature":{temperature}}}}}"#))
    }

    #[test]
    fn test_builder_defaults() {
        let (module, _) = module();

        assert_eq!(module.module_id(), "FilterModule");
        assert_eq!(module.input(), "input1");
        assert_eq!(module.pipeline().output(), "output1");
        assert_eq!(module.threshold(), 25);
    }

    #[test]
    fn test_builder_overrides() {
        let module = FilterModule::builder(Arc::new(QueueTransport::default()))
            .module_id("Edge7")
            .input("telemetry")
            .output("alerts")
            .heartbeat_output("alive")
            .threshold(-1)
            .build();

        assert_eq!(module.module_id(), "Edge7");
        assert_eq!(module.input(), "telemetry");
        assert_eq!(module.pipeline().output(), "alerts");
        assert_eq!(module.threshold(), -1);
        assert_eq!(module.methods().status_text(), "Module [Edge7] is Running");
    }

    #[test]
    fn test_unknown_input_abandoned() {
        let (module, transport) = module();

        assert_eq!(
            module.on_input_message("input2", &reading(90)),
            Disposition::Abandoned
        );
        assert!(transport.queue.lock().is_empty());
    }

    #[test]
    fn test_unknown_inputs_share_metric_label() {
        Metrics::init().unwrap();
        let (module, _) = module();

        module.on_input_message("sensor-b71c", &reading(90));

        let text = crate::metrics::gather();
        assert!(text.contains(r#"input="unknown""#));
        assert!(!text.contains("sensor-b71c"));
    }

    #[test]
    fn test_twin_update_changes_filtering() {
        let (module, _) = module();

        assert_eq!(module.on_input_message("input1", &reading(28)), Disposition::Accepted);

        module.on_twin_update(
            TwinUpdateState::Partial,
            br#"{"TemperatureThreshold":30}"#,
        );
        assert_eq!(module.threshold(), 30);
        assert_eq!(module.on_input_message("input1", &reading(28)), Disposition::Abandoned);
    }

    #[test]
    fn test_do_work_completes_sends() {
        let (module, transport) = module();

        module.on_input_message("input1", &reading(40));
        module.on_method("heartbeat", b"");
        assert_eq!(module.in_flight(), 2);

        module.do_work();

        assert_eq!(module.in_flight(), 0);
        assert_eq!(*transport.delivered.lock(), vec!["output1", "heartbeat"]);
    }

    #[tokio::test]
    async fn test_shutdown_flushes() {
        let (module, _) = module();

        module.on_input_message("input1", &reading(40));
        module.shutdown().await.unwrap();

        assert_eq!(module.in_flight(), 0);
    }
}
