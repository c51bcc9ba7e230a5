//! Fingerprint-keyed scan results with batch LRU eviction.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;
use xanados_core::config::CacheConfig;
use xanados_core::types::ScanResult;

use super::fingerprint::Fingerprint;

#[derive(Debug)]
struct CacheEntry {
    result: ScanResult,
    last_access: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: FxHashMap<Fingerprint, CacheEntry>,
    /// Current fingerprint per path, so a changed file replaces its old entry.
    by_path: FxHashMap<PathBuf, Fingerprint>,
    /// Logical clock; bumped on every insert and hit.
    clock: u64,
}

impl CacheInner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn remove(&mut self, key: &Fingerprint) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        if self.by_path.get(key.path()) == Some(key) {
            self.by_path.remove(key.path());
        }
        true
    }

    /// Drop the `count` least-recently-accessed entries.
    fn evict_lru(&mut self, count: usize) -> usize {
        let count = count.min(self.entries.len());
        if count == 0 {
            return 0;
        }
        let mut by_age: Vec<(u64, Fingerprint)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.last_access, key.clone()))
            .collect();
        if count < by_age.len() {
            by_age.select_nth_unstable_by_key(count - 1, |(age, _)| *age);
            by_age.truncate(count);
        }
        by_age
            .into_iter()
            .filter(|(_, key)| self.remove(key))
            .count()
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub lookups: u64,
    pub hit_ratio: f64,
    pub evictions: u64,
}

/// Bounded map from file fingerprint to its last scan result.
///
/// When an insert would exceed `max_entries`, the least-recently-accessed
/// `eviction_fraction` of entries (at least one) is dropped first, so the
/// cache never holds more than `max_entries` results.
#[derive(Debug)]
pub struct ResultCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
    eviction_fraction: f64,
    hits: AtomicU64,
    lookups: AtomicU64,
    evictions: AtomicU64,
}

impl ResultCache {
    /// `max_entries` is floored at 1; `eviction_fraction` is clamped to (0, 1].
    pub fn new(max_entries: usize, eviction_fraction: f64) -> Self {
        let eviction_fraction = if eviction_fraction.is_finite() && eviction_fraction > 0.0 {
            eviction_fraction.min(1.0)
        } else {
            xanados_core::constants::DEFAULT_EVICTION_FRACTION
        };
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_entries: max_entries.max(1),
            eviction_fraction,
            hits: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            config.effective_max_entries(),
            config.effective_eviction_fraction(),
        )
    }

    fn inner(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up the cached result for the file as it is on disk now.
    pub fn get(&self, path: &Path) -> Option<ScanResult> {
        self.get_fingerprint(&Fingerprint::probe(path))
    }

    /// Look up by a precomputed fingerprint. Counts toward the hit ratio.
    pub fn get_fingerprint(&self, key: &Fingerprint) -> Option<ScanResult> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner();
        let now = inner.tick();
        let entry = inner.entries.get_mut(key)?;
        entry.last_access = now;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.result.clone())
    }

    /// Fingerprint `path` now and store `result` under it.
    pub fn put(&self, path: &Path, result: ScanResult) {
        self.insert(Fingerprint::probe(path), result);
    }

    /// Store `result` under `key`, evicting a batch first if full.
    pub fn insert(&self, key: Fingerprint, result: ScanResult) {
        let mut inner = self.inner();
        let now = inner.tick();

        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.result = result;
            entry.last_access = now;
            return;
        }

        if let Some(stale) = inner.by_path.get(key.path()).cloned() {
            inner.remove(&stale);
        }

        if inner.entries.len() >= self.max_entries {
            let batch = self.batch_size(inner.entries.len());
            let evicted = inner.evict_lru(batch);
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(evicted, remaining = inner.entries.len(), "cache batch eviction");
        }

        inner.by_path.insert(key.path().to_path_buf(), key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                result,
                last_access: now,
            },
        );
    }

    /// Evict one batch of least-recently-accessed entries regardless of
    /// fill level. Returns how many were removed.
    pub fn evict(&self) -> usize {
        let mut inner = self.inner();
        let batch = self.batch_size(inner.entries.len());
        let evicted = inner.evict_lru(batch);
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }

    fn batch_size(&self, len: usize) -> usize {
        ((len as f64 * self.eviction_fraction) as usize).max(1)
    }

    /// Drop the entry for `path`, whatever its fingerprint.
    pub fn invalidate(&self, path: &Path) -> bool {
        let mut inner = self.inner();
        match inner.by_path.get(path).cloned() {
            Some(key) => inner.remove(&key),
            None => false,
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner();
        inner.entries.clear();
        inner.by_path.clear();
    }

    pub fn len(&self) -> usize {
        self.inner().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// hits / lookups, or 0.0 before the first lookup.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.lookups();
        if lookups == 0 {
            0.0
        } else {
            self.hits() as f64 / lookups as f64
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            max_entries: self.max_entries,
            hits: self.hits(),
            lookups: self.lookups(),
            hit_ratio: self.hit_ratio(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
