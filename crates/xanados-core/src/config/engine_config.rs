//! Worker pool and scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the scan engine's scheduler and worker pool.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker task count. Default: host CPU count.
    pub workers: Option<usize>,
    /// Dequeue wait before re-checking the throttle signal. Default: 1000.
    pub queue_poll_ms: Option<u64>,
    /// Sleep while the host is under pressure. Default: 250.
    pub throttle_backoff_ms: Option<u64>,
    /// Per-call detector timeout, 0 disables. Default: 300000.
    pub detector_timeout_ms: Option<u64>,
    /// Directory expansion yields after this many files. Default: 100.
    pub yield_every: Option<usize>,
    /// Results and terminal request states kept for queries. Default: 1024.
    pub result_history: Option<usize>,
    /// Rolling window for throughput metrics. Default: 60.
    pub metrics_window_secs: Option<u64>,
}

impl EngineConfig {
    /// Returns the effective worker count, defaulting to the host CPU count.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(constants::DEFAULT_WORKERS)
        })
    }

    pub fn effective_queue_poll(&self) -> Duration {
        Duration::from_millis(self.queue_poll_ms.unwrap_or(constants::DEFAULT_QUEUE_POLL_MS))
    }

    pub fn effective_throttle_backoff(&self) -> Duration {
        Duration::from_millis(
            self.throttle_backoff_ms
                .unwrap_or(constants::DEFAULT_THROTTLE_BACKOFF_MS),
        )
    }

    /// Returns the detector timeout, or `None` when disabled.
    pub fn effective_detector_timeout(&self) -> Option<Duration> {
        match self
            .detector_timeout_ms
            .unwrap_or(constants::DEFAULT_DETECTOR_TIMEOUT_MS)
        {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn effective_yield_every(&self) -> usize {
        self.yield_every
            .unwrap_or(constants::DEFAULT_YIELD_EVERY)
            .max(1)
    }

    pub fn effective_result_history(&self) -> usize {
        self.result_history
            .unwrap_or(constants::DEFAULT_RESULT_HISTORY)
    }

    pub fn effective_metrics_window(&self) -> Duration {
        Duration::from_secs(
            self.metrics_window_secs
                .unwrap_or(constants::DEFAULT_METRICS_WINDOW_SECS),
        )
    }
}
