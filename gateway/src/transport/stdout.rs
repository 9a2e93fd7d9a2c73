//! Stdout transport for local runs
//!
//! Queues sends and writes them out on the next `do_work`, completing each
//! one `Ok` once written or `Error` if the write failed. After `shutdown`
//! the queue is flushed and new sends are rejected.

use async_trait::async_trait;
use edgefilter_core::{
    Body, Confirmation, PendingSend, Rejected, Transport, TransportError, reject,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::warn;

/// Stdout transport - prints sends for debugging
pub struct StdoutTransport {
    /// Pretty print sends
    pretty: bool,
    /// Sends waiting for the next pump
    queue: Mutex<VecDeque<PendingSend>>,
    /// Destination (stdout unless overridden)
    sink: Mutex<Box<dyn Write + Send>>,
    /// Set by `shutdown`
    closed: AtomicBool,
    /// Count of sends written
    written_count: AtomicU64,
}

impl StdoutTransport {
    /// Create a new StdoutTransport
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout(), false)
    }

    /// Create a new StdoutTransport with pretty printing
    pub fn pretty() -> Self {
        Self::with_writer(std::io::stdout(), true)
    }

    /// Write to `writer` instead of stdout
    pub fn with_writer(writer: impl Write + Send + 'static, pretty: bool) -> Self {
        Self {
            pretty,
            queue: Mutex::new(VecDeque::new()),
            sink: Mutex::new(Box::new(writer)),
            closed: AtomicBool::new(false),
            written_count: AtomicU64::new(0),
        }
    }

    /// Total sends written
    pub fn written_count(&self) -> u64 {
        self.written_count.load(Ordering::Relaxed)
    }

    /// Sends waiting for the next pump
    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    fn write(&self, out: &mut dyn Write, pending: &PendingSend) -> std::io::Result<()> {
        let message = pending.message();
        let body = match message.body() {
            Body::Bytes(bytes) => String::from_utf8_lossy(bytes),
            Body::Text(text) => text.as_str().into(),
        };

        if self.pretty {
            writeln!(out, "┌─ Message ───────────────────────────────────────────")?;
            writeln!(out, "│ Output:    {}", pending.output())?;
            writeln!(out, "│ Sequence:  {}", pending.sequence_id())?;
            if let Some(content_type) = message.content_type() {
                writeln!(out, "│ Type:      {content_type}")?;
            }
            if let Some(encoding) = message.content_encoding() {
                writeln!(out, "│ Encoding:  {encoding}")?;
            }
            if !message.properties().is_empty() {
                let mut properties: Vec<_> = message.properties().iter().collect();
                properties.sort();
                writeln!(out, "│ Props:     {properties:?}")?;
            }
            writeln!(out, "│ Body:      {body}")?;
            writeln!(out, "└─────────────────────────────────────────────────────")?;
        } else {
            writeln!(out, "[{}] #{} {}", pending.output(), pending.sequence_id(), body)?;
        }
        out.flush()
    }
}

impl Default for StdoutTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdoutTransport {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn send_event_to_output(&self, pending: PendingSend) -> Result<(), Rejected> {
        if self.closed.load(Ordering::Acquire) {
            return reject(pending, TransportError::Closed);
        }
        self.queue.lock().push_back(pending);
        Ok(())
    }

    fn do_work(&self) {
        // Completion callbacks may submit again; never hold the queue lock
        // while completing.
        let drained: Vec<_> = self.queue.lock().drain(..).collect();
        if drained.is_empty() {
            return;
        }

        let mut sink = self.sink.lock();
        for pending in drained {
            match self.write(&mut **sink, &pending) {
                Ok(()) => {
                    self.written_count.fetch_add(1, Ordering::Relaxed);
                    pending.complete(Confirmation::Ok);
                }
                Err(e) => {
                    warn!(
                        sequence_id = pending.sequence_id(),
                        output = pending.output(),
                        error = %e,
                        "stdout write failed"
                    );
                    pending.complete(Confirmation::Error);
                }
            }
        }
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        self.do_work();
        Ok(())
    }
}
