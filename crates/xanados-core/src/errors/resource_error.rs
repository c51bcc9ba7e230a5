//! Resource coordinator errors.

use crate::types::ResourceKind;

/// Acquisition failure. Only possible after the coordinator has been closed.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("resource pool {kind} is closed")]
    Closed { kind: ResourceKind },
}
