//! Host capability detection and per-class limit derivation.

use serde::Serialize;
use sysinfo::System;
use xanados_core::config::ResourceConfig;
use xanados_core::types::ResourceKind;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Capability signals limits are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostCapacity {
    pub cpu_count: usize,
    pub total_memory_bytes: u64,
}

impl HostCapacity {
    pub fn new(cpu_count: usize, total_memory_bytes: u64) -> Self {
        Self {
            cpu_count: cpu_count.max(1),
            total_memory_bytes,
        }
    }

    /// Probe the running host. The CPU count falls back to the standard
    /// library's view when `sysinfo` reports none.
    pub fn detect() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_all();
        let cpu_count = match system.cpus().len() {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };
        Self::new(cpu_count, system.total_memory())
    }

    /// `max(1.0, min(cpu_count / 4, memory_gib / 8))`.
    pub fn multiplier(&self) -> f64 {
        let by_cpu = self.cpu_count as f64 / 4.0;
        let by_memory = self.total_memory_bytes as f64 / BYTES_PER_GIB / 8.0;
        by_cpu.min(by_memory).max(1.0)
    }
}

/// Baseline concurrency per class before scaling.
fn baseline(kind: ResourceKind) -> usize {
    match kind {
        ResourceKind::FileIo => 50,
        ResourceKind::Network => 20,
        ResourceKind::MlComputation => 5,
        ResourceKind::ThreatAnalysis => 30,
        ResourceKind::Database => 10,
        ResourceKind::Cache => 100,
        ResourceKind::Gpu => 2,
        ResourceKind::CpuIntensive => 4,
    }
}

/// Concurrency limit for every resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    limits: [usize; ResourceKind::COUNT],
}

impl ResourceLimits {
    /// Scale the baselines to `host`. GPU stays fixed; ML and CPU-intensive
    /// work never exceed the CPU count.
    pub fn for_host(host: &HostCapacity) -> Self {
        let multiplier = host.multiplier();
        let mut limits = [0; ResourceKind::COUNT];
        for kind in ResourceKind::ALL {
            let base = baseline(kind);
            let limit = match kind {
                ResourceKind::Gpu => base,
                ResourceKind::MlComputation | ResourceKind::CpuIntensive => {
                    scale(base, multiplier).min(host.cpu_count)
                }
                _ => scale(base, multiplier),
            };
            limits[kind.index()] = limit.max(1);
        }
        Self { limits }
    }

    /// Host-derived limits with any configured overrides applied.
    pub fn from_config(host: &HostCapacity, config: &ResourceConfig) -> Self {
        let mut limits = Self::for_host(host);
        for kind in ResourceKind::ALL {
            if let Some(limit) = config.limit_for(kind) {
                limits = limits.with_limit(kind, limit);
            }
        }
        limits
    }

    /// The same limit for every class.
    pub fn uniform(limit: usize) -> Self {
        Self {
            limits: [limit; ResourceKind::COUNT],
        }
    }

    pub fn with_limit(mut self, kind: ResourceKind, limit: usize) -> Self {
        self.limits[kind.index()] = limit;
        self
    }

    pub fn get(&self, kind: ResourceKind) -> usize {
        self.limits[kind.index()]
    }
}

fn scale(base: usize, multiplier: f64) -> usize {
    (base as f64 * multiplier).floor() as usize
}
