//! Admission control across the fixed resource classes.
//!
//! Each class is a counting semaphore plus usage counters. Workers hold
//! permits only while a detector runs, never while waiting in the queue.

pub mod coordinator;
pub mod limits;

pub use coordinator::{PoolSnapshot, ResourceCoordinator, ResourcePermit, ResourceSnapshot};
pub use limits::{HostCapacity, ResourceLimits};
