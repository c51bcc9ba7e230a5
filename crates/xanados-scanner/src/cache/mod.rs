//! Bounded result cache keyed by file fingerprint, with batch LRU eviction.

pub mod fingerprint;
pub mod result_cache;

pub use fingerprint::Fingerprint;
pub use result_cache::{CacheStats, ResultCache};
