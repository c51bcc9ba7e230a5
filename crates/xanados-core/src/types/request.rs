//! Request identity and lifecycle state.

use serde::{Deserialize, Serialize};

/// Identifier assigned to each queued scan request.
///
/// Assigned from a monotonically increasing counter, so it doubles as the
/// FIFO tie-break between requests of equal priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Where a request currently is in the scheduler.
///
/// `Queued → Completed` on a cache hit, otherwise
/// `Queued → ResourceWait → Executing → Completed | Failed`.
/// `Cancelled` is reachable only from `Queued`, or when engine shutdown
/// abandons in-flight work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Queued,
    ResourceWait,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl RequestState {
    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!RequestState::Queued.is_terminal());
        assert!(!RequestState::Executing.is_terminal());
        assert!(RequestState::Completed.is_terminal());
        assert!(RequestState::Failed.is_terminal());
        assert!(RequestState::Cancelled.is_terminal());
    }

    #[test]
    fn request_id_display() {
        assert_eq!(RequestId::new(42).to_string(), "req-42");
    }
}
