//! # xanados-core
//!
//! Foundation crate for the xanadOS scan engine.
//! Defines the scan data model, the capability traits the engine consumes,
//! errors, configuration, tracing setup, and constants.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::ScannerConfig;
pub use errors::{ConfigError, DetectionError, EngineError, ResourceError};
pub use traits::{Detector, PressureMonitor, ScanCallback};
pub use types::{
    Detection, RequestId, RequestState, ResourceKind, ScanDepth, ScanPriority, ScanResult,
    ThreatLevel,
};
