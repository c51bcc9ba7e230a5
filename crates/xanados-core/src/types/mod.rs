//! Scan data model shared between the engine and its collaborators.

pub mod priority;
pub mod request;
pub mod resource;
pub mod scan;

pub use priority::ScanPriority;
pub use request::{RequestId, RequestState};
pub use resource::ResourceKind;
pub use scan::{Detection, ScanDepth, ScanResult, ThreatLevel};
