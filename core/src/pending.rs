//! In-flight sends and their completion
//!
//! A [`PendingSend`] owns the message being transmitted until the transport
//! reports an outcome. Completion consumes the record, so it can fire at most
//! once, and the owned message is released right after the callback returns.
//!
//! ```text
//! submit ──► PendingSend ──► transport queue ──► complete(Confirmation)
//!                 │                                  │
//!                 │ rejected: abandon()              ├─► on_complete(seq, result)
//!                 ▼                                  ▼
//!           message released,                  message released
//!           no callback
//! ```
//!
//! A record dropped without being completed or abandoned (transport torn down
//! with sends still queued) completes itself with [`Confirmation::Destroyed`],
//! so every accepted send sees exactly one completion.

use crate::message::Message;
use std::fmt;

/// Delivery outcome reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confirmation {
    /// Delivered to the output
    Ok,
    /// The transport was destroyed before the send finished
    Destroyed,
    /// The send expired in the transport queue
    MessageTimeout,
    /// The transport failed to deliver
    Error,
}

impl Confirmation {
    /// Whether the message reached its output
    pub fn is_success(self) -> bool {
        matches!(self, Confirmation::Ok)
    }

    /// Stable label for logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            Confirmation::Ok => "ok",
            Confirmation::Destroyed => "destroyed",
            Confirmation::MessageTimeout => "message_timeout",
            Confirmation::Error => "error",
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback invoked once with the sequence id and outcome of a send
pub type CompletionCallback = Box<dyn FnOnce(u64, Confirmation) + Send + 'static>;

/// One outstanding asynchronous transmission
pub struct PendingSend {
    message: Message,
    output: String,
    sequence_id: u64,
    on_complete: Option<CompletionCallback>,
}

impl PendingSend {
    /// Wrap an owned message destined for `output`
    pub fn new(
        message: Message,
        output: impl Into<String>,
        sequence_id: u64,
        on_complete: impl FnOnce(u64, Confirmation) + Send + 'static,
    ) -> Self {
        Self {
            message,
            output: output.into(),
            sequence_id,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    /// The message being transmitted
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Output channel name
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Diagnostic sequence id
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// Report the delivery outcome
    ///
    /// Runs the completion callback, then releases the message.
    pub fn complete(mut self, result: Confirmation) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(self.sequence_id, result);
        }
    }

    /// Give up on a send the transport refused to enqueue
    ///
    /// The completion callback is discarded without running and the message
    /// is handed back to the caller, which releases it.
    pub fn abandon(mut self) -> Message {
        self.on_complete = None;
        std::mem::replace(&mut self.message, Message::from_bytes(bytes::Bytes::new()))
    }
}

impl fmt::Debug for PendingSend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSend")
            .field("output", &self.output)
            .field("sequence_id", &self.sequence_id)
            .field("completed", &self.on_complete.is_none())
            .finish()
    }
}

impl Drop for PendingSend {
    fn drop(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            tracing::warn!(
                sequence_id = self.sequence_id,
                output = %self.output,
                "Pending send dropped before completion"
            );
            on_complete(self.sequence_id, Confirmation::Destroyed);
        }
    }
}

/// A send the transport refused to enqueue
///
/// Hands the record back so the submitter can release it without a
/// completion.
#[derive(Debug)]
pub struct Rejected {
    /// The refused record
    pub pending: PendingSend,
    /// Why the transport refused it
    pub reason: crate::TransportError,
}

impl Rejected {
    /// Build a rejection for `pending`
    pub fn new(pending: PendingSend, reason: crate::TransportError) -> Self {
        Self { pending, reason }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (
        Arc<Mutex<Vec<(u64, Confirmation)>>>,
        impl FnOnce(u64, Confirmation) + Send + 'static,
    ) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |seq, result| sink.lock().unwrap().push((seq, result)))
    }

    #[test]
    fn test_complete_fires_once() {
        let (calls, on_complete) = recorder();
        let pending = PendingSend::new(Message::from_bytes("x"), "output1", 7, on_complete);

        assert_eq!(pending.sequence_id(), 7);
        assert_eq!(pending.output(), "output1");
        pending.complete(Confirmation::Ok);

        assert_eq!(*calls.lock().unwrap(), vec![(7, Confirmation::Ok)]);
    }

    #[test]
    fn test_drop_without_completion_reports_destroyed() {
        let (calls, on_complete) = recorder();
        let pending = PendingSend::new(Message::from_bytes("x"), "output1", 3, on_complete);

        drop(pending);

        assert_eq!(*calls.lock().unwrap(), vec![(3, Confirmation::Destroyed)]);
    }

    #[test]
    fn test_abandon_skips_callback() {
        let (calls, on_complete) = recorder();
        let pending = PendingSend::new(
            Message::from_bytes("payload").with_property("k", "v"),
            "output1",
            1,
            on_complete,
        );

        let message = pending.abandon();

        assert_eq!(message.property("k"), Some("v"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_confirmation_labels() {
        assert!(Confirmation::Ok.is_success());
        assert!(!Confirmation::Error.is_success());
        assert!(!Confirmation::Destroyed.is_success());
        assert_eq!(Confirmation::MessageTimeout.to_string(), "message_timeout");
    }

    #[test]
    fn test_pending_send_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<PendingSend>();
    }
}
