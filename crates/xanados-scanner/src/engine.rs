//! Engine lifecycle and the embedding surface.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument};
use xanados_core::config::ScannerConfig;
use xanados_core::constants::EVENT_CHANNEL_CAPACITY;
use xanados_core::errors::EngineError;
use xanados_core::tracing::metrics::names;
use xanados_core::traits::{Detector, PressureMonitor, ScanCallback, Unthrottled};
use xanados_core::types::{RequestId, RequestState, ScanDepth, ScanPriority, ScanResult};

use crate::cache::ResultCache;
use crate::metrics::{EngineMetrics, Gauges, MetricsSnapshot};
use crate::pressure::{PressureGauge, PressureSampler};
use crate::resources::ResourceCoordinator;
use crate::scheduler::{walker, PriorityClassifier, RequestTracker, ScanQueue, ScanRequest, WalkFilter};
use crate::scheduler::worker::{self, WorkerSettings};

/// Lifecycle notifications published to [`ScanEngine::subscribe`] receivers.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Queued {
        request_id: RequestId,
        path: PathBuf,
        priority: ScanPriority,
    },
    Completed {
        request_id: RequestId,
        result: ScanResult,
        from_cache: bool,
    },
    Cancelled {
        request_id: RequestId,
    },
}

/// Outcome of [`ScanEngine::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The path does not exist.
    Rejected,
    /// One request per enqueued file. `skipped` counts files excluded
    /// during directory expansion.
    Accepted {
        request_ids: Vec<RequestId>,
        skipped: usize,
    },
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn request_ids(&self) -> &[RequestId] {
        match self {
            Self::Accepted { request_ids, .. } => request_ids,
            Self::Rejected => &[],
        }
    }
}

/// State shared by the engine handle and every worker task.
pub(crate) struct Shared<D> {
    pub(crate) detector: Arc<D>,
    pub(crate) queue: ScanQueue,
    pub(crate) cache: Arc<ResultCache>,
    pub(crate) resources: Arc<ResourceCoordinator>,
    pub(crate) pressure: Arc<dyn PressureMonitor>,
    pub(crate) metrics: EngineMetrics,
    pub(crate) tracker: RequestTracker,
    pub(crate) events: broadcast::Sender<ScanEvent>,
    pub(crate) settings: WorkerSettings,
}

struct Running {
    supervisor: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
    sampler: Option<JoinHandle<()>>,
}

/// Builder for [`ScanEngine`]. Every collaborator not supplied explicitly
/// is constructed from the configuration.
pub struct ScanEngineBuilder<D> {
    detector: D,
    config: ScannerConfig,
    workers: Option<usize>,
    resources: Option<Arc<ResourceCoordinator>>,
    cache: Option<Arc<ResultCache>>,
    pressure: Option<Arc<dyn PressureMonitor>>,
    classifier: Option<PriorityClassifier>,
}

impl<D: Detector> ScanEngineBuilder<D> {
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Worker count, overriding `engine.workers`.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Share a coordinator with other engines instead of sizing a new one.
    pub fn resources(mut self, resources: Arc<ResourceCoordinator>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use an external throttle signal. Disables the built-in sampler.
    pub fn pressure_monitor(mut self, monitor: Arc<dyn PressureMonitor>) -> Self {
        self.pressure = Some(monitor);
        self
    }

    pub fn classifier(mut self, classifier: PriorityClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn build(self) -> Result<ScanEngine<D>, EngineError> {
        ScannerConfig::validate(&self.config)?;
        let config = self.config;
        let walk = WalkFilter::from_config(&config.walk)?;

        let resources = self
            .resources
            .unwrap_or_else(|| Arc::new(ResourceCoordinator::for_host(&config.resources)));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ResultCache::from_config(&config.cache)));

        let mut sampler = None;
        let pressure: Arc<dyn PressureMonitor> = match self.pressure {
            Some(monitor) => monitor,
            None if config.pressure.effective_enabled() => {
                let gauge = Arc::new(PressureGauge::from_config(&config.pressure));
                sampler = Some((Arc::clone(&gauge), config.pressure.effective_sample_interval()));
                gauge
            }
            None => Arc::new(Unthrottled),
        };

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            detector: Arc::new(self.detector),
            queue: ScanQueue::new(),
            cache,
            resources,
            pressure,
            metrics: EngineMetrics::new(config.engine.effective_metrics_window()),
            tracker: RequestTracker::new(config.engine.effective_result_history()),
            events,
            settings: WorkerSettings {
                queue_poll: config.engine.effective_queue_poll(),
                throttle_backoff: config.engine.effective_throttle_backoff(),
                detector_timeout: config.engine.effective_detector_timeout(),
            },
        });

        Ok(ScanEngine {
            shared,
            classifier: self.classifier.unwrap_or_else(PriorityClassifier::from_env),
            walk,
            workers: self
                .workers
                .unwrap_or_else(|| config.engine.effective_workers()),
            yield_every: config.engine.effective_yield_every(),
            sampler,
            running: Mutex::new(None),
        })
    }
}

/// Priority-queued scan dispatcher over a pluggable [`Detector`].
///
/// Construct with [`ScanEngine::builder`], `start()` it on a tokio runtime,
/// `submit` paths, and `stop().await` when done. Requests may be submitted
/// before `start`; they wait in the queue.
pub struct ScanEngine<D: Detector> {
    shared: Arc<Shared<D>>,
    classifier: PriorityClassifier,
    walk: WalkFilter,
    workers: usize,
    yield_every: usize,
    sampler: Option<(Arc<PressureGauge>, Duration)>,
    running: Mutex<Option<Running>>,
}

impl<D: Detector> ScanEngine<D> {
    pub fn builder(detector: D) -> ScanEngineBuilder<D> {
        ScanEngineBuilder {
            detector,
            config: ScannerConfig::default(),
            workers: None,
            resources: None,
            cache: None,
            pressure: None,
            classifier: None,
        }
    }

    fn running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the worker pool and the pressure sampler. Calling it again
    /// while running is a no-op.
    pub fn start(&self) -> Result<(), EngineError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        if self.workers == 0 {
            return Err(EngineError::NoWorkers);
        }

        let mut running = self.running();
        if running.is_some() {
            return Ok(());
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let supervisor = runtime.spawn(worker::supervise(
            self.workers,
            Arc::clone(&self.shared),
            shutdown_rx,
        ));
        let sampler = self
            .sampler
            .as_ref()
            .map(|(gauge, interval)| PressureSampler::new(Arc::clone(gauge), *interval).spawn());

        info!(
            workers = self.workers,
            detector = self.shared.detector.name(),
            queued = self.shared.queue.len(),
            "scan engine started"
        );
        *running = Some(Running {
            supervisor,
            shutdown,
            sampler,
        });
        Ok(())
    }

    /// Stop workers and the sampler and cancel everything pending.
    ///
    /// In-flight detector calls are abandoned. Every worker has terminated
    /// and released its permits by the time this returns. Calling it again
    /// is a no-op.
    pub async fn stop(&self) {
        let Some(running) = self.running().take() else {
            return;
        };

        let _ = running.shutdown.send(true);
        if let Some(sampler) = &running.sampler {
            sampler.abort();
        }
        for handle in std::iter::once(running.supervisor).chain(running.sampler) {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!(error = %e, "engine task failed during shutdown");
                }
            }
        }

        let drained = self.shared.queue.drain();
        for request in &drained {
            self.shared
                .tracker
                .finish(request.id, RequestState::Cancelled, None);
            let _ = self.shared.events.send(ScanEvent::Cancelled {
                request_id: request.id,
            });
        }
        let abandoned = self.shared.tracker.abandon_all();

        info!(
            cancelled_queued = drained.len(),
            abandoned, "scan engine stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.running().is_some()
    }

    /// Queue `path` for scanning. Directories expand to one request per
    /// regular file. A nonexistent path is rejected.
    pub async fn submit(
        &self,
        path: impl AsRef<Path>,
        depth: ScanDepth,
        callback: Option<Arc<dyn ScanCallback>>,
    ) -> Submission {
        let path = path.as_ref();
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "submission rejected");
                return Submission::Rejected;
            }
        };

        if !metadata.is_dir() {
            let id = self.enqueue(path.to_path_buf(), metadata.len(), depth, callback);
            return Submission::Accepted {
                request_ids: vec![id],
                skipped: 0,
            };
        }

        // Files are queued batch by batch, so workers start on a large tree
        // before the walk finishes.
        let mut request_ids = Vec::new();
        let skipped = walker::expand_with(path, &self.walk, self.yield_every, |file| {
            request_ids.push(self.enqueue(file.path, file.size, depth, callback.clone()));
        })
        .instrument(tracing::debug_span!(names::EXPAND, root = %path.display()))
        .await;
        debug!(
            root = %path.display(),
            queued = request_ids.len(),
            skipped,
            "directory expanded"
        );
        Submission::Accepted {
            request_ids,
            skipped,
        }
    }

    fn enqueue(
        &self,
        path: PathBuf,
        size: u64,
        depth: ScanDepth,
        callback: Option<Arc<dyn ScanCallback>>,
    ) -> RequestId {
        let id = self.shared.queue.next_id();
        let priority = self.classifier.classify(&path);
        // Registered before the push so a worker can never settle it first.
        self.shared.tracker.register(id);
        let _ = self.shared.events.send(ScanEvent::Queued {
            request_id: id,
            path: path.clone(),
            priority,
        });
        debug!(request_id = %id, path = %path.display(), priority = %priority, depth = %depth, "request queued");
        self.shared
            .queue
            .push(ScanRequest::new(id, path, priority, depth, size).with_callback(callback));
        id
    }

    /// Remove a request that has not been dispatched yet.
    pub fn cancel(&self, id: RequestId) -> bool {
        let Some(request) = self.shared.queue.cancel(id) else {
            return false;
        };
        self.shared
            .tracker
            .finish(request.id, RequestState::Cancelled, None);
        let _ = self
            .shared
            .events
            .send(ScanEvent::Cancelled { request_id: id });
        self.shared.tracker.settle();
        debug!(request_id = %id, "request cancelled");
        true
    }

    /// Latest known state of a request, if it is still tracked.
    pub fn status(&self, id: RequestId) -> Option<RequestState> {
        self.shared.tracker.status(id)
    }

    /// Resolve once every submitted request has completed, failed, or been
    /// cancelled. Never resolves while requests sit in a stopped engine's
    /// queue waiting for `start`.
    pub async fn wait_for_idle(&self) {
        self.shared.tracker.wait_for_idle().await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.shared.events.subscribe()
    }

    /// Most recent results, oldest first.
    pub fn recent_results(&self) -> Vec<ScanResult> {
        self.shared.tracker.recent_results()
    }

    pub fn queue_depth(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.shared.cache
    }

    pub fn resources(&self) -> &Arc<ResourceCoordinator> {
        &self.shared.resources
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot(Gauges {
            cache_hit_ratio: self.shared.cache.hit_ratio(),
            cache_entries: self.shared.cache.len(),
            queue_depth: self.shared.queue.len(),
            resources: self.shared.resources.snapshot(),
        })
    }
}

impl<D: Detector> Drop for ScanEngine<D> {
    fn drop(&mut self) {
        // Aborting the supervisor drops its pool, which aborts every worker.
        if let Some(running) = self.running().take() {
            running.supervisor.abort();
            if let Some(sampler) = running.sampler {
                sampler.abort();
            }
        }
    }
}
