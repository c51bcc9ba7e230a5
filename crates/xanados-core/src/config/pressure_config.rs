//! Host pressure sampling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the background CPU/memory sampler.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PressureConfig {
    /// Run the sampler and honor its throttle signal. Default: true.
    pub enabled: Option<bool>,
    /// CPU utilization that pauses dispatch. Default: 90.0.
    pub cpu_threshold_percent: Option<f32>,
    /// Memory utilization that pauses dispatch. Default: 90.0.
    pub memory_threshold_percent: Option<f32>,
    /// Interval between samples. Default: 1500.
    pub sample_interval_ms: Option<u64>,
}

impl PressureConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn effective_cpu_threshold(&self) -> f32 {
        self.cpu_threshold_percent
            .unwrap_or(constants::DEFAULT_CPU_THRESHOLD_PERCENT)
    }

    pub fn effective_memory_threshold(&self) -> f32 {
        self.memory_threshold_percent
            .unwrap_or(constants::DEFAULT_MEMORY_THRESHOLD_PERCENT)
    }

    pub fn effective_sample_interval(&self) -> Duration {
        Duration::from_millis(
            self.sample_interval_ms
                .unwrap_or(constants::DEFAULT_SAMPLE_INTERVAL_MS),
        )
    }
}
