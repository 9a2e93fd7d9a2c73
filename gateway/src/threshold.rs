//! Temperature threshold store
//!
//! The threshold is read by the ingest pipeline on every message and written
//! by the configuration handler when a twin update arrives. The two paths
//! run on independent triggers and may race, so the value lives in a single
//! atomic and is shared by `Arc`:
//!
//! ```text
//! ConfigurationHandler ──set──► ThresholdStore ◄──get── IngestPipeline
//! ```

use std::sync::atomic::{AtomicI64, Ordering};

/// Threshold used until a configuration update says otherwise
pub const DEFAULT_TEMPERATURE_THRESHOLD: i64 = 25;

/// Concurrency-safe holder for the temperature threshold
///
/// No bounds are enforced: zero or negative thresholds are legal and make
/// every reading exceed them.
#[derive(Debug)]
pub struct ThresholdStore {
    value: AtomicI64,
}

impl ThresholdStore {
    /// Create a store holding `initial`
    pub fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }

    /// Current threshold
    #[inline]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Replace the threshold, returning the previous value
    pub fn set(&self, threshold: i64) -> i64 {
        self.value.swap(threshold, Ordering::AcqRel)
    }
}

impl Default for ThresholdStore {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPERATURE_THRESHOLD)
    }
}
