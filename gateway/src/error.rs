//! Error types for the filter module

use thiserror::Error;

// Re-export TransportError from edgefilter-core
pub use edgefilter_core::TransportError;

/// Result type alias for module operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Main error type for the filter module
///
/// None of the message or control-plane handlers return this: they always
/// produce a disposition or status. It covers startup and configuration.
#[derive(Error, Debug)]
pub enum FilterError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport error
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Metrics error
    #[error("metrics error: {0}")]
    Metrics(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_converts() {
        let err: FilterError = TransportError::Closed.into();
        assert!(matches!(err, FilterError::Transport(TransportError::Closed)));
        assert_eq!(err.to_string(), "transport error: transport closed");
    }

    #[test]
    fn test_config_error_display() {
        let err = FilterError::Config("EDGEFILTER_POLL_INTERVAL_MS must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: EDGEFILTER_POLL_INTERVAL_MS must be > 0"
        );
    }
}
