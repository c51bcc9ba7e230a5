//! Priority scheduling: requests, the queue, classification, directory
//! expansion, request tracking, and the worker loop.

pub mod priority;
pub mod queue;
pub mod request;
pub mod tracker;
pub mod walker;
pub(crate) mod worker;

pub use priority::PriorityClassifier;
pub use queue::ScanQueue;
pub use request::ScanRequest;
pub use tracker::RequestTracker;
pub use walker::{Expansion, ExpandedFile, WalkFilter};
