//! # xanados-scanner
//!
//! Async scan scheduling and resource coordination for the xanadOS engine:
//! a priority queue drained by a worker pool, semaphore-gated resource
//! pools, a fingerprint-keyed result cache with batch LRU eviction, and a
//! host pressure sampler that pauses dispatch under load.
//!
//! The detector itself is supplied by the embedding application through
//! [`xanados_core::Detector`].

pub mod cache;
pub mod engine;
pub mod metrics;
pub mod pressure;
pub mod resources;
pub mod scheduler;

pub use cache::{Fingerprint, ResultCache};
pub use engine::{ScanEngine, ScanEngineBuilder, ScanEvent, Submission};
pub use metrics::MetricsSnapshot;
pub use pressure::{PressureGauge, PressureSampler};
pub use resources::{ResourceCoordinator, ResourceLimits, ResourcePermit, ResourceSnapshot};
pub use scheduler::PriorityClassifier;
