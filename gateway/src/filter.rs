//! Temperature filter
//!
//! Decides whether a reading is an alert and builds the enriched copy that
//! goes downstream.
//!
//! # Decision
//!
//! ```text
//! body bytes ──► parse JSON ──► machine.temperature ──► > threshold ?
//!     │              │                  │                    │
//!  Dropped(Unreadable)  Dropped(Malformed)            no: Dropped(BelowThreshold)
//!                                                     yes: Forwarded(alert)
//! ```
//!
//! The threshold is passed in rather than read from the store, which keeps
//! the function pure.

use crate::document::Document;
use edgefilter_core::Message;
use edgefilter_core::property_keys::{
    ALERT, DEFAULT_CONTENT_ENCODING, DEFAULT_CONTENT_TYPE, MESSAGE_TYPE,
};

/// Dotted path of the measured value inside the message body
pub const TEMPERATURE_PATH: &str = "machine.temperature";

/// Why a message was not forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The body is not a byte array
    Unreadable,
    /// Not JSON, or no numeric `machine.temperature`
    Malformed,
    /// Temperature at or below the threshold
    BelowThreshold,
}

impl DropReason {
    /// Stable label for logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Unreadable => "unreadable",
            DropReason::Malformed => "malformed",
            DropReason::BelowThreshold => "below_threshold",
        }
    }
}

/// Outcome of [`evaluate`]
#[derive(Debug, Clone, PartialEq)]
pub enum FilterResult {
    /// No output
    Dropped(DropReason),
    /// Enriched alert to send downstream
    Forwarded(Message),
}

impl FilterResult {
    /// Whether the message was dropped
    pub fn is_dropped(&self) -> bool {
        matches!(self, FilterResult::Dropped(_))
    }

    /// The forwarded message, if any
    pub fn into_forwarded(self) -> Option<Message> {
        match self {
            FilterResult::Forwarded(message) => Some(message),
            FilterResult::Dropped(_) => None,
        }
    }
}

/// Evaluate a message against `threshold`
///
/// Forwards only when `machine.temperature` is strictly greater than the
/// threshold. Anything that cannot be read or parsed is dropped.
pub fn evaluate(message: &Message, threshold: i64) -> FilterResult {
    let Some(body) = message.byte_array() else {
        return FilterResult::Dropped(DropReason::Unreadable);
    };

    let temperature = match Document::parse(body) {
        Ok(doc) => doc.nested_number(TEMPERATURE_PATH),
        Err(e) => {
            tracing::debug!(error = %e, "Message body is not a JSON object");
            None
        }
    };
    let Some(temperature) = temperature else {
        return FilterResult::Dropped(DropReason::Malformed);
    };

    if temperature > threshold as f64 {
        FilterResult::Forwarded(enrich(message, body.clone()))
    } else {
        FilterResult::Dropped(DropReason::BelowThreshold)
    }
}

/// Build the alert: same body, copied properties, defaulted system metadata,
/// and the alert marker set last
fn enrich(source: &Message, body: bytes::Bytes) -> Message {
    let mut alert = Message::from_bytes(body);

    for (key, value) in source.properties() {
        alert.set_property(key.as_str(), value.as_str());
    }

    alert.set_content_type(source.content_type().unwrap_or(DEFAULT_CONTENT_TYPE));
    alert.set_content_encoding(
        source
            .content_encoding()
            .unwrap_or(DEFAULT_CONTENT_ENCODING),
    );

    alert.set_property(MESSAGE_TYPE, ALERT);
    alert
}
