//! Semaphore-gated resource pools with live usage counters.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};
use xanados_core::config::ResourceConfig;
use xanados_core::errors::ResourceError;
use xanados_core::types::ResourceKind;

use super::limits::{HostCapacity, ResourceLimits};

#[derive(Debug, Default)]
struct PoolCounters {
    active: usize,
    peak: usize,
    total: u64,
}

#[derive(Debug)]
struct Pool {
    kind: ResourceKind,
    limit: usize,
    semaphore: Arc<Semaphore>,
    counters: Mutex<PoolCounters>,
}

impl Pool {
    fn new(kind: ResourceKind, limit: usize) -> Self {
        let limit = limit.min(Semaphore::MAX_PERMITS);
        Self {
            kind,
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
            counters: Mutex::new(PoolCounters::default()),
        }
    }

    fn counters(&self) -> std::sync::MutexGuard<'_, PoolCounters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_acquire(&self) {
        let mut counters = self.counters();
        counters.active += 1;
        counters.total += 1;
        counters.peak = counters.peak.max(counters.active);
    }

    /// Floors at zero so an unbalanced release can never underflow.
    fn record_release(&self) {
        let mut counters = self.counters();
        counters.active = counters.active.saturating_sub(1);
    }

    fn snapshot(&self) -> PoolSnapshot {
        let counters = self.counters();
        let utilization_percent = if self.limit == 0 {
            0.0
        } else {
            counters.active as f64 / self.limit as f64 * 100.0
        };
        PoolSnapshot {
            kind: self.kind,
            active: counters.active,
            limit: self.limit,
            peak: counters.peak,
            total: counters.total,
            utilization_percent,
        }
    }
}

/// A held slot in one resource pool.
///
/// Dropping it releases the slot, on every exit path including task
/// cancellation and panics.
#[derive(Debug)]
pub struct ResourcePermit {
    pool: Arc<Pool>,
    _permit: OwnedSemaphorePermit,
}

impl ResourcePermit {
    pub fn kind(&self) -> ResourceKind {
        self.pool.kind
    }
}

impl Drop for ResourcePermit {
    fn drop(&mut self) {
        // Counters go down before the semaphore slot is returned, so
        // `active` never exceeds the number of outstanding slots.
        self.pool.record_release();
    }
}

/// Point-in-time usage of one pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSnapshot {
    pub kind: ResourceKind,
    pub active: usize,
    pub limit: usize,
    pub peak: usize,
    pub total: u64,
    pub utilization_percent: f64,
}

/// Point-in-time usage of every pool, in acquisition order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub pools: Vec<PoolSnapshot>,
}

impl ResourceSnapshot {
    pub fn get(&self, kind: ResourceKind) -> Option<&PoolSnapshot> {
        self.pools.iter().find(|p| p.kind == kind)
    }
}

/// Process-wide admission control over the fixed resource classes.
///
/// Construct once and share by `Arc` with every engine that should draw
/// from the same capacity.
#[derive(Debug)]
pub struct ResourceCoordinator {
    pools: Vec<Arc<Pool>>,
}

impl ResourceCoordinator {
    /// Create a coordinator with explicit limits.
    pub fn new(limits: ResourceLimits) -> Self {
        let pools = ResourceKind::ALL
            .iter()
            .map(|&kind| Arc::new(Pool::new(kind, limits.get(kind))))
            .collect();
        Self { pools }
    }

    /// Create a coordinator sized to the running host, honoring overrides.
    pub fn for_host(config: &ResourceConfig) -> Self {
        let host = HostCapacity::detect();
        let limits = ResourceLimits::from_config(&host, config);
        info!(
            cpu_count = host.cpu_count,
            total_memory_bytes = host.total_memory_bytes,
            multiplier = host.multiplier(),
            "resource coordinator sized to host"
        );
        Self::new(limits)
    }

    fn pool(&self, kind: ResourceKind) -> &Arc<Pool> {
        &self.pools[kind.index()]
    }

    /// Wait for a permit in `kind`'s pool.
    ///
    /// Only fails after `close()`; otherwise it suspends until a slot frees.
    pub async fn acquire(&self, kind: ResourceKind) -> Result<ResourcePermit, ResourceError> {
        let pool = self.pool(kind);
        let permit = Arc::clone(&pool.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ResourceError::Closed { kind })?;
        pool.record_acquire();
        debug!(kind = %kind, "resource permit acquired");
        Ok(ResourcePermit {
            pool: Arc::clone(pool),
            _permit: permit,
        })
    }

    /// Take a permit only if one is free right now.
    pub fn try_acquire(&self, kind: ResourceKind) -> Option<ResourcePermit> {
        let pool = self.pool(kind);
        let permit = Arc::clone(&pool.semaphore).try_acquire_owned().ok()?;
        pool.record_acquire();
        Some(ResourcePermit {
            pool: Arc::clone(pool),
            _permit: permit,
        })
    }

    /// Acquire one permit per kind, always in acquisition order.
    ///
    /// Sorting here means callers cannot deadlock each other by asking for
    /// the same classes in different orders. Permits already taken are
    /// released if a later acquisition fails.
    pub async fn acquire_all(
        &self,
        kinds: &[ResourceKind],
    ) -> Result<Vec<ResourcePermit>, ResourceError> {
        let mut ordered = kinds.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut permits = Vec::with_capacity(ordered.len());
        for kind in ordered {
            permits.push(self.acquire(kind).await?);
        }
        Ok(permits)
    }

    /// Configured limit of `kind`'s pool.
    pub fn limit(&self, kind: ResourceKind) -> usize {
        self.pool(kind).limit
    }

    /// Current holders of `kind`'s pool.
    pub fn active(&self, kind: ResourceKind) -> usize {
        self.pool(kind).counters().active
    }

    /// Read-only view of every pool.
    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            pools: self.pools.iter().map(|p| p.snapshot()).collect(),
        }
    }

    /// Close every pool. Pending and future acquisitions fail with
    /// `ResourceError::Closed`; permits already held stay valid until dropped.
    pub fn close(&self) {
        for pool in &self.pools {
            pool.semaphore.close();
        }
        info!("resource coordinator closed");
    }
}
