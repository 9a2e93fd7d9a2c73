//! Configuration (twin) updates
//!
//! Accepts either a full twin document, whose settings sit under `desired`,
//! or a delta that carries the settings at its root:
//!
//! ```text
//! {"desired":{"TemperatureThreshold":30,"$version":4},"reported":{..}}
//! {"TemperatureThreshold":30,"$version":5}
//! ```
//!
//! Nothing here is fatal. An unparseable document or a missing field leaves
//! the threshold unchanged.

use crate::document::{Document, number_at};
use crate::metrics::Metrics;
use crate::threshold::ThresholdStore;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key of the settings object inside a full twin document
pub const DESIRED_KEY: &str = "desired";

/// Setting holding the temperature threshold
pub const TEMPERATURE_THRESHOLD_KEY: &str = "TemperatureThreshold";

/// Whether an update carries the full twin or only changed properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwinUpdateState {
    /// Whole document (desired + reported)
    Complete,
    /// Desired-property delta
    Partial,
}

impl fmt::Display for TwinUpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwinUpdateState::Complete => f.write_str("complete"),
            TwinUpdateState::Partial => f.write_str("partial"),
        }
    }
}

/// What a configuration update did to the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdUpdate {
    /// Threshold written
    Applied {
        /// Value before the update
        previous: i64,
        /// Value now in the store
        current: i64,
    },
    /// Document unparseable or without a numeric threshold
    Ignored,
}

/// Applies twin updates to the shared threshold store
pub struct ConfigurationHandler {
    store: Arc<ThresholdStore>,
}

impl ConfigurationHandler {
    /// Create a handler writing to `store`
    pub fn new(store: Arc<ThresholdStore>) -> Self {
        Self { store }
    }

    /// Apply a twin update payload
    ///
    /// Fractional thresholds are truncated toward zero. Values beyond the
    /// `i64` range saturate.
    pub fn on_configuration_update(
        &self,
        state: TwinUpdateState,
        payload: &[u8],
    ) -> ThresholdUpdate {
        let doc = match Document::parse(payload) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(%state, error = %e, "Ignoring unparseable twin update");
                return ThresholdUpdate::Ignored;
            }
        };

        let settings = match doc.nested_object(DESIRED_KEY) {
            Some(desired) => desired,
            None => {
                if doc.has_field(DESIRED_KEY) {
                    debug!(%state, "Twin `desired` is not an object, reading the root");
                }
                doc.root()
            }
        };
        let Some(value) = number_at(settings, TEMPERATURE_THRESHOLD_KEY) else {
            debug!(%state, "Twin update carries no temperature threshold");
            return ThresholdUpdate::Ignored;
        };

        let current = value as i64;
        let previous = self.store.set(current);
        if let Some(metrics) = Metrics::get() {
            metrics.set_threshold(current);
        }
        info!(%state, previous, current, "Temperature threshold updated");

        ThresholdUpdate::Applied { previous, current }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn handler() -> (ConfigurationHandler, Arc<ThresholdStore>) {
        let store = Arc::new(ThresholdStore::default());
        (ConfigurationHandler::new(Arc::clone(&store)), store)
    }

    #[test]
    fn test_desired_wrapper() {
        let (handler, store) = handler();

        let update = handler.on_configuration_update(
            TwinUpdateState::Complete,
            br#"{"desired":{"TemperatureThreshold":30}}"#,
        );

        assert_eq!(
            update,
            ThresholdUpdate::Applied {
                previous: 25,
                current: 30
            }
        );
        assert_eq!(store.get(), 30);
    }

    #[test]
    fn test_root_level_delta() {
        let (handler, store) = handler();

        handler.on_configuration_update(
            TwinUpdateState::Partial,
            br#"{"TemperatureThreshold":40,"$version":7}"#,
        );

        assert_eq!(store.get(), 40);
    }

    #[test]
    fn test_desired_takes_precedence_over_root() {
        let (handler, store) = handler();

        handler.on_configuration_update(
            TwinUpdateState::Complete,
            br#"{"TemperatureThreshold":99,"desired":{"TemperatureThreshold":31}}"#,
        );

        assert_eq!(store.get(), 31);
    }

    #[test]
    fn test_non_object_desired_falls_back_to_root() {
        let (handler, store) = handler();

        let update = handler.on_configuration_update(
            TwinUpdateState::Partial,
            br#"{"desired":5,"TemperatureThreshold":33}"#,
        );

        assert_eq!(
            update,
            ThresholdUpdate::Applied {
                previous: 25,
                current: 33
            }
        );
        assert_eq!(store.get(), 33);
    }

    #[test]
    fn test_desired_without_threshold_is_noop() {
        let (handler, store) = handler();

        let update = handler.on_configuration_update(
            TwinUpdateState::Complete,
            br#"{"desired":{"$version":2},"TemperatureThreshold":99}"#,
        );

        assert_eq!(update, ThresholdUpdate::Ignored);
        assert_eq!(store.get(), 25);
    }

    #[test]
    fn test_missing_field_is_noop() {
        let (handler, store) = handler();

        let update =
            handler.on_configuration_update(TwinUpdateState::Partial, br#"{"$version":3}"#);

        assert_eq!(update, ThresholdUpdate::Ignored);
        assert_eq!(store.get(), 25);
    }

    #[test]
    fn test_unparseable_is_noop() {
        let (handler, store) = handler();

        for payload in [&b"not json"[..], b"", b"[30]", b"\xff"] {
            let update = handler.on_configuration_update(TwinUpdateState::Partial, payload);
            assert_eq!(update, ThresholdUpdate::Ignored);
        }
        assert_eq!(store.get(), 25);
    }

    #[test]
    fn test_non_numeric_threshold_is_noop() {
        let (handler, store) = handler();

        handler.on_configuration_update(
            TwinUpdateState::Partial,
            br#"{"TemperatureThreshold":"30"}"#,
        );

        assert_eq!(store.get(), 25);
    }

    #[test]
    fn test_fraction_truncated() {
        let (handler, store) = handler();

        handler.on_configuration_update(TwinUpdateState::Partial, br#"{"TemperatureThreshold":30.9}"#);
        assert_eq!(store.get(), 30);

        handler.on_configuration_update(TwinUpdateState::Partial, br#"{"TemperatureThreshold":-2.7}"#);
        assert_eq!(store.get(), -2);
    }

    #[test]
    fn test_out_of_range_saturates() {
        let (handler, store) = handler();

        handler.on_configuration_update(TwinUpdateState::Partial, br#"{"TemperatureThreshold":1e300}"#);

        assert_eq!(store.get(), i64::MAX);
    }

    #[test]
    fn test_state_deserializes_lowercase() {
        let state: TwinUpdateState = serde_json::from_str(r#""partial""#).unwrap();
        assert_eq!(state, TwinUpdateState::Partial);
        assert_eq!(TwinUpdateState::Complete.to_string(), "complete");
    }
}
