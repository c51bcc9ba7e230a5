//! Per-request state, bounded result history, and the outstanding counter
//! behind `wait_for_idle`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tokio::sync::watch;
use xanados_core::types::{RequestId, RequestState, ScanResult};

#[derive(Debug, Default)]
struct History {
    /// Terminal request ids, oldest first.
    finished: VecDeque<RequestId>,
    results: VecDeque<ScanResult>,
}

/// Tracks every request from registration until it is acknowledged.
///
/// A request is outstanding from `register` until `settle`; `wait_for_idle`
/// resolves when none are outstanding. Terminal states and results are
/// kept for the most recent `history` requests only.
#[derive(Debug)]
pub struct RequestTracker {
    states: DashMap<RequestId, RequestState>,
    history: Mutex<History>,
    capacity: usize,
    outstanding: watch::Sender<usize>,
}

impl RequestTracker {
    pub fn new(capacity: usize) -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            states: DashMap::new(),
            history: Mutex::new(History::default()),
            capacity,
            outstanding,
        }
    }

    fn history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new queued request and count it as outstanding.
    pub fn register(&self, id: RequestId) {
        self.states.insert(id, RequestState::Queued);
        self.outstanding.send_modify(|n| *n += 1);
    }

    /// Move a live request to a non-terminal state.
    pub fn transition(&self, id: RequestId, state: RequestState) {
        if let Some(mut current) = self.states.get_mut(&id) {
            if !current.is_terminal() {
                *current = state;
            }
        }
    }

    /// Record a terminal state and, if present, the result. Does not
    /// settle the request; callers do that after notifying listeners.
    pub fn finish(&self, id: RequestId, state: RequestState, result: Option<&ScanResult>) {
        self.states.insert(id, state);

        let mut history = self.history();
        history.finished.push_back(id);
        while history.finished.len() > self.capacity {
            if let Some(old) = history.finished.pop_front() {
                self.states.remove(&old);
            }
        }
        if let Some(result) = result {
            history.results.push_back(result.clone());
            while history.results.len() > self.capacity {
                history.results.pop_front();
            }
        }
    }

    /// Acknowledge one request as fully handled.
    pub fn settle(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }

    pub fn status(&self, id: RequestId) -> Option<RequestState> {
        self.states.get(&id).map(|s| *s)
    }

    /// Most recent results, oldest first.
    pub fn recent_results(&self) -> Vec<ScanResult> {
        self.history().results.iter().cloned().collect()
    }

    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Resolve once no registered request is outstanding.
    pub async fn wait_for_idle(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives as long as `self`, so this only ends at zero.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Mark every non-terminal request cancelled and zero the outstanding
    /// count. Used by engine shutdown after workers have stopped.
    pub fn abandon_all(&self) -> usize {
        let live: Vec<RequestId> = self
            .states
            .iter()
            .filter(|entry| !entry.value().is_terminal())
            .map(|entry| *entry.key())
            .collect();
        for id in &live {
            self.finish(*id, RequestState::Cancelled, None);
        }
        self.outstanding.send_replace(0);
        live.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use xanados_core::types::{Detection, ScanDepth};

    use super::*;

    fn result(n: u64) -> ScanResult {
        ScanResult::from_detection(format!("/r/{n}"), ScanDepth::Quick, n, 0, Detection::clean())
    }

    #[test]
    fn terminal_state_is_sticky() {
        let tracker = RequestTracker::new(8);
        let id = RequestId::new(1);
        tracker.register(id);
        tracker.transition(id, RequestState::Executing);
        tracker.finish(id, RequestState::Completed, Some(&result(1)));
        tracker.transition(id, RequestState::ResourceWait);
        assert_eq!(tracker.status(id), Some(RequestState::Completed));
    }

    #[test]
    fn history_is_bounded() {
        let tracker = RequestTracker::new(2);
        for n in 1..=3 {
            let id = RequestId::new(n);
            tracker.register(id);
            tracker.finish(id, RequestState::Completed, Some(&result(n)));
            tracker.settle();
        }
        assert_eq!(tracker.status(RequestId::new(1)), None);
        assert_eq!(tracker.status(RequestId::new(3)), Some(RequestState::Completed));
        let paths: Vec<_> = tracker
            .recent_results()
            .into_iter()
            .map(|r| r.file_size_bytes)
            .collect();
        assert_eq!(paths, vec![2, 3]);
        assert_eq!(tracker.outstanding(), 0);
    }

    #[test]
    fn settle_never_underflows() {
        let tracker = RequestTracker::new(2);
        tracker.settle();
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn wait_for_idle_resolves_after_last_settle() {
        let tracker = Arc::new(RequestTracker::new(8));
        tracker.register(RequestId::new(1));
        tracker.register(RequestId::new(2));

        let waiter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.wait_for_idle().await })
        };
        tracker.settle();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        tracker.settle();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn abandon_cancels_live_requests() {
        let tracker = RequestTracker::new(8);
        tracker.register(RequestId::new(1));
        tracker.register(RequestId::new(2));
        tracker.transition(RequestId::new(2), RequestState::Executing);
        assert_eq!(tracker.abandon_all(), 2);
        assert_eq!(tracker.status(RequestId::new(2)), Some(RequestState::Cancelled));
        assert_eq!(tracker.outstanding(), 0);
    }
}
