//! `ScanRequest` and its queue ordering.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use xanados_core::traits::ScanCallback;
use xanados_core::types::{RequestId, ScanDepth, ScanPriority};

/// One file waiting to be scanned.
///
/// Ordered by `(priority, created_at, id)` ascending: the smallest request is
/// served first. `id` is assigned monotonically, so the order is total even
/// when two `created_at` instants compare equal.
#[derive(Clone)]
pub struct ScanRequest {
    pub id: RequestId,
    pub path: PathBuf,
    pub priority: ScanPriority,
    pub depth: ScanDepth,
    pub estimated_size: u64,
    pub created_at: Instant,
    pub callback: Option<Arc<dyn ScanCallback>>,
}

impl ScanRequest {
    pub fn new(
        id: RequestId,
        path: impl Into<PathBuf>,
        priority: ScanPriority,
        depth: ScanDepth,
        estimated_size: u64,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            priority,
            depth,
            estimated_size,
            created_at: Instant::now(),
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: Option<Arc<dyn ScanCallback>>) -> Self {
        self.callback = callback;
        self
    }

    fn order_key(&self) -> (ScanPriority, Instant, RequestId) {
        (self.priority, self.created_at, self.id)
    }
}

impl fmt::Debug for ScanRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanRequest")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("priority", &self.priority)
            .field("depth", &self.depth)
            .field("estimated_size", &self.estimated_size)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl PartialEq for ScanRequest {
    fn eq(&self, other: &Self) -> bool {
        self.order_key() == other.order_key()
    }
}

impl Eq for ScanRequest {}

impl PartialOrd for ScanRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScanRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: u64, priority: ScanPriority) -> ScanRequest {
        ScanRequest::new(
            RequestId::new(id),
            format!("/data/{id}"),
            priority,
            ScanDepth::Quick,
            0,
        )
    }

    #[test]
    fn priority_dominates_age() {
        let older = request(1, ScanPriority::Low);
        let newer = request(2, ScanPriority::Critical);
        assert!(newer < older);
    }

    #[test]
    fn equal_priority_falls_back_to_id() {
        let mut a = request(1, ScanPriority::Medium);
        let mut b = request(2, ScanPriority::Medium);
        let now = Instant::now();
        a.created_at = now;
        b.created_at = now;
        assert!(a < b);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_omits_callback_body() {
        let req = request(7, ScanPriority::High)
            .with_callback(Some(Arc::new(|_: &xanados_core::types::ScanResult| {})));
        let text = format!("{req:?}");
        assert!(text.contains("has_callback: true"));
    }
}
