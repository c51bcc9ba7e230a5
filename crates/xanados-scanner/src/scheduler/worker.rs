//! Worker loop: dequeue, consult the cache, acquire permits, run the
//! detector, report.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle, JoinSet};
use tracing::{debug, error, warn, Instrument};
use xanados_core::errors::DetectionError;
use xanados_core::scan_span;
use xanados_core::traits::Detector;
use xanados_core::types::{Detection, RequestId, RequestState, ScanResult};

use super::request::ScanRequest;
use super::tracker::RequestTracker;
use crate::cache::Fingerprint;
use crate::engine::{ScanEvent, Shared};

#[derive(Debug, Clone, Copy)]
pub(crate) struct WorkerSettings {
    pub(crate) queue_poll: Duration,
    pub(crate) throttle_backoff: Duration,
    pub(crate) detector_timeout: Option<Duration>,
}

/// Aborts the wrapped task when dropped.
pub(crate) struct AbortOnDrop<T>(pub(crate) JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Own the worker pool until shutdown is signalled, respawning any worker
/// that panics. On shutdown every worker is aborted and awaited before this
/// returns, so no worker can still hold a permit or report a result.
pub(crate) async fn supervise<D: Detector>(
    workers: usize,
    shared: Arc<Shared<D>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut pool = JoinSet::new();
    let mut ids: FxHashMap<task::Id, usize> = FxHashMap::default();
    for worker_id in 0..workers {
        let handle = pool.spawn(run(worker_id, Arc::clone(&shared)));
        ids.insert(handle.id(), worker_id);
    }

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            joined = pool.join_next_with_id() => match joined {
                None => break,
                Some(Ok((id, ()))) => {
                    ids.remove(&id);
                }
                Some(Err(e)) if e.is_panic() => {
                    let worker_id = ids.remove(&e.id()).unwrap_or_default();
                    error!(worker_id, error = %panic_message(e.into_panic()), "worker panicked, restarting");
                    let handle = pool.spawn(run(worker_id, Arc::clone(&shared)));
                    ids.insert(handle.id(), worker_id);
                }
                Some(Err(e)) => {
                    ids.remove(&e.id());
                }
            },
        }
    }

    pool.shutdown().await;
    debug!(workers, "worker pool shut down");
}

async fn run<D: Detector>(worker_id: usize, shared: Arc<Shared<D>>) {
    debug!(worker_id, "worker started");
    loop {
        if shared.pressure.should_throttle() {
            tokio::time::sleep(shared.settings.throttle_backoff).await;
            continue;
        }
        let Some(request) = shared.queue.pop_timeout(shared.settings.queue_poll).await else {
            continue;
        };
        let span = scan_span!(request.id, request.path, request.depth);
        process(&shared, request).instrument(span).await;
    }
}

/// Settles a request if its worker panics mid-flight, so `wait_for_idle`
/// cannot hang on it. Shutdown aborts are handled by the engine instead.
struct PanicGuard<'a> {
    tracker: &'a RequestTracker,
    id: RequestId,
    armed: bool,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if self.armed && std::thread::panicking() {
            self.tracker.finish(self.id, RequestState::Failed, None);
            self.tracker.settle();
        }
    }
}

async fn process<D: Detector>(shared: &Shared<D>, request: ScanRequest) {
    let mut guard = PanicGuard {
        tracker: &shared.tracker,
        id: request.id,
        armed: true,
    };

    let fingerprint = Fingerprint::probe_async(&request.path).await;
    if request.depth.consults_cache() {
        if let Some(cached) = shared.cache.get_fingerprint(&fingerprint) {
            debug!("cache hit");
            guard.armed = false;
            report(shared, request, cached, true);
            return;
        }
    }
    let file_size = fingerprint.size().unwrap_or(request.estimated_size);

    shared
        .tracker
        .transition(request.id, RequestState::ResourceWait);
    // Only detector time is measured; waiting for permits is not scan time.
    let (outcome, duration_ms) = match shared
        .resources
        .acquire_all(request.depth.required_resources())
        .await
    {
        Ok(permits) => {
            shared.tracker.transition(request.id, RequestState::Executing);
            let _in_flight = shared.metrics.begin_execution();
            let started = Instant::now();
            let outcome = invoke(shared, &request).await;
            let elapsed = started.elapsed();
            drop(permits);
            (outcome, elapsed.as_millis() as u64)
        }
        Err(e) => (
            Err(DetectionError::ResourceUnavailable {
                reason: e.to_string(),
            }),
            0,
        ),
    };

    let result = match outcome {
        Ok(detection) => {
            debug!(duration_ms, threat_level = ?detection.threat_level, "detection finished");
            ScanResult::from_detection(
                request.path.clone(),
                request.depth,
                file_size,
                duration_ms,
                detection,
            )
        }
        Err(e) => {
            warn!(error = %e, "detection failed");
            ScanResult::failed(request.path.clone(), request.depth, file_size, duration_ms, &e)
        }
    };

    // Failures are not cached so the next submission retries.
    if !result.is_error() {
        shared.cache.insert(fingerprint, result.clone());
    }
    guard.armed = false;
    report(shared, request, result, false);
}

/// Run the detector in its own task so a panic surfaces as a `JoinError`.
/// The task is aborted if this future is dropped or the timeout expires.
async fn invoke<D: Detector>(
    shared: &Shared<D>,
    request: &ScanRequest,
) -> Result<Detection, DetectionError> {
    let detector = Arc::clone(&shared.detector);
    let path = request.path.clone();
    let depth = request.depth;
    let mut task = AbortOnDrop(tokio::spawn(async move { detector.scan(&path, depth).await }));

    let joined = match shared.settings.detector_timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut task.0).await {
            Ok(joined) => joined,
            Err(_) => {
                return Err(DetectionError::TimedOut {
                    timeout_ms: limit.as_millis() as u64,
                })
            }
        },
        None => (&mut task.0).await,
    };

    match joined {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => Err(DetectionError::Panicked {
            reason: panic_message(e.into_panic()),
        }),
        Err(e) => Err(DetectionError::failed(e.to_string())),
    }
}

/// Record the result, publish it, run the callback, then settle.
fn report<D>(shared: &Shared<D>, request: ScanRequest, result: ScanResult, from_cache: bool) {
    let state = if result.is_error() {
        RequestState::Failed
    } else {
        RequestState::Completed
    };
    shared.metrics.record(&result, from_cache);
    shared.tracker.finish(request.id, state, Some(&result));

    if let Some(callback) = &request.callback {
        let outcome =
            std::panic::catch_unwind(AssertUnwindSafe(|| callback.on_result(&result)));
        if let Err(panic) = outcome {
            warn!(request_id = %request.id, error = %panic_message(panic), "scan callback panicked");
        }
    }

    let _ = shared.events.send(ScanEvent::Completed {
        request_id: request.id,
        result,
        from_cache,
    });
    shared.tracker.settle();
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
