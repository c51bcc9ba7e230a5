//! Engine throughput metrics: lifetime totals plus a rolling window.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use xanados_core::types::ScanResult;

use crate::resources::ResourceSnapshot;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    bytes: u64,
    /// `None` for cache hits, which carry no scan time.
    scan_ms: Option<u64>,
}

#[derive(Debug, Default)]
struct Totals {
    files_scanned: u64,
    bytes_scanned: u64,
    failures: u64,
    cache_hits: u64,
    timed_scans: u64,
    total_scan_ms: u64,
    window: VecDeque<Sample>,
}

/// Counters updated by workers after every result.
#[derive(Debug)]
pub struct EngineMetrics {
    totals: Mutex<Totals>,
    window: Duration,
    started: Instant,
    in_flight: AtomicUsize,
}

/// Serializable view returned by `ScanEngine::metrics_snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub files_scanned: u64,
    pub bytes_scanned: u64,
    pub failures: u64,
    pub cache_hits: u64,
    pub avg_scan_ms: f64,
    pub window_secs: u64,
    pub window_files: u64,
    pub window_avg_scan_ms: f64,
    pub throughput_mb_per_sec: f64,
    pub cache_hit_ratio: f64,
    pub cache_entries: usize,
    pub queue_depth: usize,
    pub in_flight: usize,
    pub resources: ResourceSnapshot,
}

/// Engine-side gauges folded into a snapshot alongside the counters.
#[derive(Debug, Clone)]
pub(crate) struct Gauges {
    pub cache_hit_ratio: f64,
    pub cache_entries: usize,
    pub queue_depth: usize,
    pub resources: ResourceSnapshot,
}

/// Counts one executing detector call for as long as it is alive.
#[derive(Debug)]
pub(crate) struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}

impl EngineMetrics {
    pub fn new(window: Duration) -> Self {
        Self {
            totals: Mutex::new(Totals::default()),
            window,
            started: Instant::now(),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn totals(&self) -> MutexGuard<'_, Totals> {
        self.totals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn begin_execution(&self) -> InFlightGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            counter: &self.in_flight,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Fold one result into the counters. Failed results count only as
    /// failures; cache hits count as scanned files without scan time.
    pub fn record(&self, result: &ScanResult, from_cache: bool) {
        let now = Instant::now();
        let mut totals = self.totals();
        if result.is_error() {
            totals.failures += 1;
            return;
        }

        totals.files_scanned += 1;
        totals.bytes_scanned += result.file_size_bytes;
        let scan_ms = if from_cache {
            totals.cache_hits += 1;
            None
        } else {
            totals.timed_scans += 1;
            totals.total_scan_ms += result.scan_duration_ms;
            Some(result.scan_duration_ms)
        };
        totals.window.push_back(Sample {
            at: now,
            bytes: result.file_size_bytes,
            scan_ms,
        });
        Self::prune(&mut totals.window, now, self.window);
    }

    fn prune(window: &mut VecDeque<Sample>, now: Instant, span: Duration) {
        while window
            .front()
            .is_some_and(|s| now.duration_since(s.at) > span)
        {
            window.pop_front();
        }
    }

    pub(crate) fn snapshot(&self, gauges: Gauges) -> MetricsSnapshot {
        let now = Instant::now();
        let mut totals = self.totals();
        Self::prune(&mut totals.window, now, self.window);

        let avg_scan_ms = mean(totals.total_scan_ms, totals.timed_scans);
        let window_files = totals.window.len() as u64;
        let window_bytes: u64 = totals.window.iter().map(|s| s.bytes).sum();
        let (window_ms, window_timed) = totals
            .window
            .iter()
            .filter_map(|s| s.scan_ms)
            .fold((0u64, 0u64), |(ms, n), s| (ms + s, n + 1));

        // Early on the window has not filled yet; measure over what elapsed.
        let span = self.window.min(now.duration_since(self.started));
        let throughput_mb_per_sec = if span.is_zero() {
            0.0
        } else {
            window_bytes as f64 / BYTES_PER_MB / span.as_secs_f64()
        };

        MetricsSnapshot {
            files_scanned: totals.files_scanned,
            bytes_scanned: totals.bytes_scanned,
            failures: totals.failures,
            cache_hits: totals.cache_hits,
            avg_scan_ms,
            window_secs: self.window.as_secs(),
            window_files,
            window_avg_scan_ms: mean(window_ms, window_timed),
            throughput_mb_per_sec,
            cache_hit_ratio: gauges.cache_hit_ratio,
            cache_entries: gauges.cache_entries,
            queue_depth: gauges.queue_depth,
            in_flight: self.in_flight(),
            resources: gauges.resources,
        }
    }
}

fn mean(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use xanados_core::errors::DetectionError;
    use xanados_core::types::{Detection, ScanDepth};

    use super::*;

    fn gauges() -> Gauges {
        Gauges {
            cache_hit_ratio: 0.5,
            cache_entries: 3,
            queue_depth: 2,
            resources: ResourceSnapshot { pools: Vec::new() },
        }
    }

    fn ok(size: u64, ms: u64) -> ScanResult {
        ScanResult::from_detection("/m", ScanDepth::Quick, size, ms, Detection::clean())
    }

    #[test]
    fn lifetime_and_window_counters() {
        let metrics = EngineMetrics::new(Duration::from_secs(60));
        metrics.record(&ok(1024, 10), false);
        metrics.record(&ok(2048, 30), false);
        metrics.record(&ok(4096, 999), true);
        metrics.record(
            &ScanResult::failed("/m", ScanDepth::Quick, 1, 5, &DetectionError::failed("boom")),
            false,
        );

        let snap = metrics.snapshot(gauges());
        assert_eq!(snap.files_scanned, 3);
        assert_eq!(snap.bytes_scanned, 7168);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.avg_scan_ms, 20.0, "cache hits carry no scan time");
        assert_eq!(snap.window_files, 3);
        assert_eq!(snap.window_avg_scan_ms, 20.0);
        assert_eq!(snap.queue_depth, 2);
        assert!(snap.throughput_mb_per_sec >= 0.0);
    }

    #[test]
    fn in_flight_guard_counts() {
        let metrics = EngineMetrics::new(Duration::from_secs(1));
        let a = metrics.begin_execution();
        let b = metrics.begin_execution();
        assert_eq!(metrics.in_flight(), 2);
        drop(a);
        drop(b);
        assert_eq!(metrics.in_flight(), 0);
    }

    #[test]
    fn empty_snapshot_is_zeroed() {
        let snap = EngineMetrics::new(Duration::from_secs(60)).snapshot(gauges());
        assert_eq!(snap.files_scanned, 0);
        assert_eq!(snap.avg_scan_ms, 0.0);
        assert_eq!(snap.throughput_mb_per_sec, 0.0);
    }
}
