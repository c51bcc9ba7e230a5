//! Capacity and invalidation tests for the result cache.

use std::path::PathBuf;

use proptest::prelude::*;
use xanados_core::config::CacheConfig;
use xanados_core::types::{Detection, ScanDepth, ScanResult};
use xanados_scanner::{Fingerprint, ResultCache};

fn result_for(path: &std::path::Path, size: u64) -> ScanResult {
    ScanResult::from_detection(path, ScanDepth::Quick, size, 3, Detection::clean())
}

#[test]
fn put_and_get_follow_file_changes() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("tracked.txt");
    std::fs::write(&file, b"v1").unwrap();

    let cache = ResultCache::new(16, 0.1);
    cache.put(&file, result_for(&file, 2));
    assert_eq!(cache.get(&file), Some(result_for(&file, 2)));

    std::fs::write(&file, b"version two").unwrap();
    assert!(cache.get(&file).is_none(), "size change invalidates");
    assert_eq!(cache.lookups(), 2);
    assert_eq!(cache.hits(), 1);
}

#[test]
fn missing_file_uses_path_only_key() {
    let cache = ResultCache::new(4, 0.5);
    let ghost = PathBuf::from("/no/such/file.bin");
    cache.put(&ghost, result_for(&ghost, 0));
    assert!(cache.get(&ghost).is_some());
    assert!(cache
        .get_fingerprint(&Fingerprint::PathOnly(ghost.clone()))
        .is_some());
}

#[test]
fn from_config_uses_defaults() {
    let cache = ResultCache::from_config(&CacheConfig::default());
    assert_eq!(cache.max_entries(), 10_000);
    assert_eq!(cache.stats().hit_ratio, 0.0);
}

#[test]
fn default_fraction_evicts_a_tenth() {
    let cache = ResultCache::new(100, 0.1);
    for n in 0..101u64 {
        let path = PathBuf::from(format!("/bulk/{n}"));
        cache.insert(Fingerprint::PathOnly(path.clone()), result_for(&path, n));
    }
    assert_eq!(cache.len(), 91);
    assert_eq!(cache.stats().evictions, 10);
}

proptest! {
    #[test]
    fn size_never_exceeds_capacity(
        max_entries in 1usize..64,
        extra in 1usize..64,
        fraction in 0.01f64..=1.0,
    ) {
        let cache = ResultCache::new(max_entries, fraction);
        for n in 0..(max_entries + extra) {
            let path = PathBuf::from(format!("/prop/{n}"));
            cache.insert(Fingerprint::PathOnly(path.clone()), result_for(&path, n as u64));
            prop_assert!(cache.len() <= max_entries);
        }
        prop_assert!(cache.len() >= 1);
    }
}
