//! Error types for edgefilter transports

use thiserror::Error;

/// Error type for transport operations
///
/// Returned by [`Transport`](crate::Transport) implementations when a send
/// cannot be enqueued or the transport fails to start or stop. Delivery
/// failures that happen *after* a send was accepted are not errors: they are
/// reported through the pending send's [`Confirmation`](crate::Confirmation).
///
/// # Example
///
/// ```
/// use edgefilter_core::TransportError;
///
/// fn connect() -> Result<(), TransportError> {
///     Err(TransportError::Connection("refused".to_string()))
/// }
///
/// match connect() {
///     Ok(_) => println!("Connected!"),
///     Err(TransportError::Connection(msg)) => println!("Connection failed: {}", msg),
///     Err(e) => println!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport refused to enqueue a message
    ///
    /// Examples: outbound queue unavailable, invalid output name.
    #[error("send failed: {0}")]
    Send(String),

    /// Connection error
    ///
    /// Examples: broker unreachable, TLS handshake error, credentials rejected.
    #[error("connection error: {0}")]
    Connection(String),

    /// The transport is not ready to accept sends yet
    #[error("transport not ready")]
    NotReady,

    /// The transport has been shut down and accepts no further sends
    #[error("transport closed")]
    Closed,

    /// Shutdown error
    ///
    /// Examples: failed to flush queued sends.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}
