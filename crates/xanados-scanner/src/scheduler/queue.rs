//! The shared priority queue workers drain.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use xanados_core::types::RequestId;

use super::request::ScanRequest;

/// Min-heap of pending requests plus a wakeup signal for idle workers.
///
/// Also owns the request id counter, so ids reflect enqueue order.
#[derive(Debug, Default)]
pub struct ScanQueue {
    heap: Mutex<BinaryHeap<Reverse<ScanRequest>>>,
    notify: Notify,
    next_id: AtomicU64,
}

impl ScanQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn heap(&self) -> MutexGuard<'_, BinaryHeap<Reverse<ScanRequest>>> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate the next request id. Ids start at 1.
    pub fn next_id(&self) -> RequestId {
        RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn push(&self, request: ScanRequest) {
        self.heap().push(Reverse(request));
        self.notify.notify_one();
    }

    /// Pop the highest-priority request without waiting.
    pub fn try_pop(&self) -> Option<ScanRequest> {
        self.heap().pop().map(|Reverse(request)| request)
    }

    /// Pop the highest-priority request, waiting up to `timeout` for one to
    /// arrive. `None` means the wait expired with the queue still empty.
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<ScanRequest> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await still wakes us.
            notified.as_mut().enable();

            if let Some(request) = self.try_pop() {
                return Some(request);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.try_pop();
            }
        }
    }

    /// Remove a queued request. Returns it if it had not been dispatched.
    pub fn cancel(&self, id: RequestId) -> Option<ScanRequest> {
        let mut heap = self.heap();
        if !heap.iter().any(|Reverse(r)| r.id == id) {
            return None;
        }
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *heap)
            .into_vec()
            .into_iter()
            .partition(|Reverse(r)| r.id == id);
        *heap = BinaryHeap::from(kept);
        removed.into_iter().next().map(|Reverse(request)| request)
    }

    /// Empty the queue, returning what was pending in dispatch order.
    pub fn drain(&self) -> Vec<ScanRequest> {
        let mut pending: Vec<ScanRequest> =
            self.heap().drain().map(|Reverse(request)| request).collect();
        pending.sort();
        pending
    }

    pub fn len(&self) -> usize {
        self.heap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use xanados_core::types::{ScanDepth, ScanPriority};

    use super::*;

    fn enqueue(queue: &ScanQueue, priority: ScanPriority) -> RequestId {
        let id = queue.next_id();
        queue.push(ScanRequest::new(
            id,
            format!("/q/{id}"),
            priority,
            ScanDepth::Quick,
            0,
        ));
        id
    }

    #[test]
    fn pops_by_priority_then_fifo() {
        let queue = ScanQueue::new();
        let low = enqueue(&queue, ScanPriority::Low);
        let crit_a = enqueue(&queue, ScanPriority::Critical);
        let medium = enqueue(&queue, ScanPriority::Medium);
        let crit_b = enqueue(&queue, ScanPriority::Critical);

        let order: Vec<_> = std::iter::from_fn(|| queue.try_pop().map(|r| r.id)).collect();
        assert_eq!(order, vec![crit_a, crit_b, medium, low]);
    }

    #[test]
    fn cancel_removes_only_target() {
        let queue = ScanQueue::new();
        let a = enqueue(&queue, ScanPriority::High);
        let b = enqueue(&queue, ScanPriority::High);
        assert_eq!(queue.cancel(a).map(|r| r.id), Some(a));
        assert!(queue.cancel(a).is_none(), "second cancel is a no-op");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_pop().map(|r| r.id), Some(b));
    }

    #[test]
    fn drain_returns_dispatch_order() {
        let queue = ScanQueue::new();
        let bg = enqueue(&queue, ScanPriority::Background);
        let hi = enqueue(&queue, ScanPriority::High);
        let drained: Vec<_> = queue.drain().into_iter().map(|r| r.id).collect();
        assert_eq!(drained, vec![hi, bg]);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pop_timeout_expires_on_empty_queue() {
        let queue = ScanQueue::new();
        assert!(queue.pop_timeout(Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test]
    async fn pop_timeout_wakes_on_push() {
        let queue = Arc::new(ScanQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop_timeout(Duration::from_secs(30)).await })
        };
        tokio::task::yield_now().await;
        let id = enqueue(&queue, ScanPriority::Low);
        let popped = waiter.await.unwrap();
        assert_eq!(popped.map(|r| r.id), Some(id));
    }

    fn priority_strategy() -> impl Strategy<Value = ScanPriority> {
        prop_oneof![
            Just(ScanPriority::Critical),
            Just(ScanPriority::High),
            Just(ScanPriority::Medium),
            Just(ScanPriority::Low),
            Just(ScanPriority::Background),
        ]
    }

    proptest! {
        #[test]
        fn extraction_is_totally_ordered(priorities in prop::collection::vec(priority_strategy(), 1..64)) {
            let queue = ScanQueue::new();
            for priority in &priorities {
                enqueue(&queue, *priority);
            }
            let popped: Vec<_> = std::iter::from_fn(|| queue.try_pop()).collect();
            prop_assert_eq!(popped.len(), priorities.len());
            for pair in popped.windows(2) {
                prop_assert!(
                    (pair[0].priority, pair[0].id) < (pair[1].priority, pair[1].id),
                    "{:?} served before {:?}", pair[0], pair[1]
                );
            }
        }
    }
}
