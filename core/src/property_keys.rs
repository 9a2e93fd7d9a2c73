//! Reserved property names and system metadata defaults
//!
//! Alerts are marked with a user property rather than a distinct message
//! type so downstream routes can match on it.

/// Property injected on every forwarded alert
pub const MESSAGE_TYPE: &str = "MessageType";

/// Value of [`MESSAGE_TYPE`] on forwarded alerts
pub const ALERT: &str = "Alert";

/// Content type applied when the source message carries none
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Content encoding applied when the source message carries none
pub const DEFAULT_CONTENT_ENCODING: &str = "utf-8";
