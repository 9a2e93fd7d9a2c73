//! Message type for edgefilter
//!
//! A [`Message`] is what the transport hands to the input handler and what
//! the module hands back for delivery. The body uses `Bytes`, so an alert
//! built from an inbound message only bumps a refcount on the payload.
//!
//! # Ownership
//!
//! ```text
//! transport ──&Message──► input handler      (borrowed for the callback only)
//!                              │
//!                              ▼ enrich
//!                         owned Message ──► PendingSend ──► transport
//! ```

use bytes::Bytes;
use std::borrow::Cow;
use std::collections::HashMap;

/// User-defined message properties
pub type Properties = HashMap<String, String>;

/// Message body as delivered by the transport
///
/// Transports distinguish binary bodies from string bodies. Only a
/// [`Body::Bytes`] body can be read as a byte array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Binary payload (usually JSON)
    Bytes(Bytes),
    /// String payload
    Text(String),
}

/// A unit of telemetry or control data
///
/// # Example
///
/// ```
/// use edgefilter_core::Message;
///
/// let msg = Message::from_bytes(r#"{"machine":{"temperature":26}}"#)
///     .with_property("site", "hall-3");
/// assert_eq!(msg.property("site"), Some("hall-3"));
/// assert!(msg.content_type().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    body: Body,
    properties: Properties,
    content_type: Option<String>,
    content_encoding: Option<String>,
}

impl Message {
    /// Create a message with a binary body
    pub fn from_bytes(body: impl Into<Bytes>) -> Self {
        Self::with_body(Body::Bytes(body.into()))
    }

    /// Create a message with a string body
    pub fn from_text(body: impl Into<String>) -> Self {
        Self::with_body(Body::Text(body.into()))
    }

    fn with_body(body: Body) -> Self {
        Self {
            body,
            properties: Properties::new(),
            content_type: None,
            content_encoding: None,
        }
    }

    /// Add a property (builder style)
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set the content type (builder style)
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the content encoding (builder style)
    pub fn with_content_encoding(mut self, content_encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(content_encoding.into());
        self
    }

    /// The message body
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The body as a byte array, if it is a binary body
    #[inline]
    pub fn byte_array(&self) -> Option<&Bytes> {
        match &self.body {
            Body::Bytes(bytes) => Some(bytes),
            Body::Text(_) => None,
        }
    }

    /// Body rendered for logs: the byte array as (lossy) UTF-8, or `<null>`
    /// when the body is not readable as bytes
    pub fn body_for_log(&self) -> Cow<'_, str> {
        match self.byte_array() {
            Some(bytes) => String::from_utf8_lossy(bytes),
            None => Cow::Borrowed("<null>"),
        }
    }

    /// Get a property value
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Set a property, replacing any previous value for the key
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// All user properties
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Content type system property
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Set the content type system property
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    /// Content encoding system property
    pub fn content_encoding(&self) -> Option<&str> {
        self.content_encoding.as_deref()
    }

    /// Set the content encoding system property
    pub fn set_content_encoding(&mut self, content_encoding: impl Into<String>) {
        self.content_encoding = Some(content_encoding.into());
    }
}
