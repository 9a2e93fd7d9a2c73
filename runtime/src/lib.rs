//! edgefilter runtime - process driver for the filter module
//!
//! Provides [`run()`] for zero-boilerplate startup, and [`RuntimeBuilder`]
//! for callers who need a different transport or input.
//!
//! # Quick start
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     edgefilter_runtime::run(|module| async move {
//!         Ok(module.threshold(30))
//!     }).await
//! }
//! ```
//!
//! # Poll loop
//!
//! ```text
//! stdin ──► reader thread ──► line channel ──► InboundEvent ──► FilterModule handlers
//! tick ────────► module.do_work()  (transport pump, completions)
//! EOF / Ctrl+C / SIGTERM ──► module.shutdown()  (flush pending sends)
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod inbound;
pub mod prelude;

use edgefilter_gateway::config::{Config, LogFormat};
use edgefilter_gateway::metrics::Metrics;
use edgefilter_gateway::metrics_server::MetricsServer;
use edgefilter_gateway::{FilterModule, FilterModuleBuilder, StdoutTransport, Transport};
use std::future::Future;
use std::io::{BufRead, ErrorKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run the filter module with default settings.
///
/// Loads configuration from environment variables, initialises tracing and
/// metrics, calls your closure to adjust the module, then drives it from
/// stdin until EOF or a shutdown signal.
///
/// # Example
///
/// ```ignore
/// edgefilter_runtime::run(|module| async move {
///     Ok(module.heartbeat_output("liveness"))
/// }).await
/// ```
pub async fn run<F, Fut>(configure: F) -> anyhow::Result<()>
where
    F: FnOnce(FilterModuleBuilder) -> Fut,
    Fut: Future<Output = anyhow::Result<FilterModuleBuilder>>,
{
    RuntimeBuilder::new().configure(configure).await
}

/// Power-user builder for controlling runtime behaviour.
///
/// # Example
///
/// ```ignore
/// RuntimeBuilder::new()
///     .transport(Arc::new(StdoutTransport::pretty()))
///     .disable_metrics()
///     .configure(|module| async move { Ok(module) })
///     .await
/// ```
pub struct RuntimeBuilder {
    transport: Option<Arc<dyn Transport>>,
    metrics_enabled: bool,
}

impl RuntimeBuilder {
    /// Create a new builder with defaults from environment variables.
    pub fn new() -> Self {
        Self {
            transport: None,
            metrics_enabled: true,
        }
    }

    /// Send through `transport` instead of stdout.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Disable the metrics HTTP server.
    ///
    /// Metrics are still recorded.
    pub fn disable_metrics(mut self) -> Self {
        self.metrics_enabled = false;
        self
    }

    /// Configure the module and run it to completion.
    ///
    /// This is the terminal method; it returns after shutdown.
    pub async fn configure<F, Fut>(self, configure: F) -> anyhow::Result<()>
    where
        F: FnOnce(FilterModuleBuilder) -> Fut,
        Fut: Future<Output = anyhow::Result<FilterModuleBuilder>>,
    {
        // ── 1. Load config from env ──────────────────────────────
        let config = Config::from_env()?;

        // ── 2. Init tracing ──────────────────────────────────────
        init_tracing(&config);

        info!(
            module_id = %config.module_id,
            input = %config.input,
            output = %config.output,
            threshold = config.temperature_threshold,
            poll_interval_ms = config.poll_interval_ms,
            "Starting edgefilter"
        );

        // ── 3. Init metrics + HTTP server ────────────────────────
        Metrics::init()?;
        let metrics_handle = match config.metrics_addr {
            Some(addr) if self.metrics_enabled => Some(MetricsServer::start(addr)),
            _ => {
                info!("Metrics server disabled");
                None
            }
        };

        // ── 4. Pre-configure the module from env ─────────────────
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(StdoutTransport::new()));
        let builder = builder_from_config(transport, &config);

        // ── 5. User adjusts the module ───────────────────────────
        let module = configure(builder).await?.build();

        // ── 6. Drive until EOF or signal ─────────────────────────
        let input = read_lines(std::io::BufReader::new(std::io::stdin()));
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        drive(&module, input, poll_interval, shutdown_signal()).await?;

        // ── 7. Shutdown ──────────────────────────────────────────
        if let Some(handle) = metrics_handle {
            handle.abort();
        }
        info!("edgefilter shutdown complete");

        Ok(())
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Module builder preset from `config`
pub fn builder_from_config(transport: Arc<dyn Transport>, config: &Config) -> FilterModuleBuilder {
    FilterModule::builder(transport)
        .module_id(config.module_id.clone())
        .input(config.input.clone())
        .output(config.output.clone())
        .heartbeat_output(config.heartbeat_output.clone())
        .threshold(config.temperature_threshold)
}

/// Counters from one [`drive`] run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriveSummary {
    /// Events handed to the module
    pub dispatched: u64,
    /// Lines skipped (blank, not UTF-8, or unparseable)
    pub skipped: u64,
}

/// Lines buffered between the reader thread and the driver
const LINE_CHANNEL_CAPACITY: usize = 1024;

/// Read raw lines from `reader` on a dedicated thread.
///
/// The channel closes at EOF or on the first I/O error. A blocked read never
/// holds up [`drive`]: once the receiver is gone the thread exits on its next
/// line, and the process does not wait for it.
pub fn read_lines<R>(mut reader: R) -> mpsc::Receiver<Vec<u8>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    std::thread::spawn(move || {
        loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(error = %e, "Failed to read input");
                    break;
                }
            }
        }
    });
    rx
}

/// Feed `lines` to `module`, pumping its transport every `poll_interval`,
/// until the input ends or `shutdown` resolves. The transport is shut down
/// before returning.
pub async fn drive<S>(
    module: &FilterModule,
    mut lines: mpsc::Receiver<Vec<u8>>,
    poll_interval: Duration,
    shutdown: S,
) -> anyhow::Result<DriveSummary>
where
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut summary = DriveSummary::default();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => module.do_work(),
            line = lines.recv() => match line {
                Some(raw) => match std::str::from_utf8(&raw) {
                    Ok(line) => match inbound::dispatch_line(module, line) {
                        Some(_) => summary.dispatched += 1,
                        None => summary.skipped += 1,
                    },
                    Err(e) => {
                        warn!(error = %e, len = raw.len(), "Skipping non-UTF-8 input line");
                        summary.skipped += 1;
                    }
                },
                None => {
                    info!("Input closed");
                    break;
                }
            },
        }
    }

    module.shutdown().await?;
    info!(
        dispatched = summary.dispatched,
        skipped = summary.skipped,
        in_flight = module.in_flight(),
        "Driver stopped"
    );

    Ok(summary)
}

/// Initialise the tracing subscriber based on config.
fn init_tracing(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());

    // Stdout carries sends; logs go to stderr.
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = ?e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
