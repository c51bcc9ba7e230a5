//! Shared constants for the scan engine.

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default worker count when the host CPU count cannot be determined.
pub const DEFAULT_WORKERS: usize = 4;

/// Queue dequeue wait before a worker re-checks the throttle signal.
pub const DEFAULT_QUEUE_POLL_MS: u64 = 1000;

/// Sleep applied by a worker while the host is under pressure.
pub const DEFAULT_THROTTLE_BACKOFF_MS: u64 = 250;

/// Per-call detector timeout (5 minutes). Zero disables the timeout.
pub const DEFAULT_DETECTOR_TIMEOUT_MS: u64 = 300_000;

/// Directory expansion yields to the scheduler after this many files.
pub const DEFAULT_YIELD_EVERY: usize = 100;

/// Completed results and terminal request states retained for queries.
pub const DEFAULT_RESULT_HISTORY: usize = 1024;

/// Rolling window used for throughput and average scan time.
pub const DEFAULT_METRICS_WINDOW_SECS: u64 = 60;

/// Result cache capacity.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Share of the cache evicted in one batch when it is full.
pub const DEFAULT_EVICTION_FRACTION: f64 = 0.10;

/// Host CPU utilization at which dispatch pauses.
pub const DEFAULT_CPU_THRESHOLD_PERCENT: f32 = 90.0;

/// Host memory utilization at which dispatch pauses.
pub const DEFAULT_MEMORY_THRESHOLD_PERCENT: f32 = 90.0;

/// Interval between host pressure samples.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1500;

/// Files larger than this are skipped during directory expansion (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Pseudo-filesystems never descended into during directory expansion.
pub const DEFAULT_EXCLUDED_ROOTS: &[&str] = &["/proc", "/sys", "/dev", "/run"];

/// Version-control metadata directories skipped during directory expansion.
pub const VCS_DIRS: &[&str] = &[".git", ".svn", ".hg", ".bzr", "CVS"];

/// Capacity of the scan event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
