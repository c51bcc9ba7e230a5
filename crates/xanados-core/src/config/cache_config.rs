//! Result cache configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the fingerprint-keyed result cache.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached results. Default: 10000.
    pub max_entries: Option<usize>,
    /// Share of entries evicted per batch when full. Default: 0.10.
    pub eviction_fraction: Option<f64>,
}

impl CacheConfig {
    pub fn effective_max_entries(&self) -> usize {
        self.max_entries
            .unwrap_or(constants::DEFAULT_CACHE_MAX_ENTRIES)
    }

    pub fn effective_eviction_fraction(&self) -> f64 {
        self.eviction_fraction
            .unwrap_or(constants::DEFAULT_EVICTION_FRACTION)
    }
}
