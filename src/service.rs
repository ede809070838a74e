//! Job Service
//!
//! Caller-facing facade over the store, queue, admission gates and worker
//! pool. `enqueue` returns as soon as the job is recorded and queued; callers
//! learn the outcome by polling `status`.

use crate::category::Category;
use crate::config::JobGateConfig;
use crate::dispatch::DispatchTable;
use crate::error::QueueError;
use crate::gate::AdmissionGate;
use crate::job::JobStatusReport;
use crate::queue::FifoQueue;
use crate::store::{JobStore, QueueStats};
use crate::types::{JobId, JobInput};
use crate::worker::{WorkerContext, WorkerPool};
use parking_lot::Mutex;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

struct Sweeper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct JobService {
    store: Arc<JobStore>,
    queue: Arc<FifoQueue>,
    gate: Arc<AdmissionGate>,
    dispatch: Arc<DispatchTable>,
    pool: WorkerPool,
    eviction_max_age: Option<chrono::Duration>,
    sweep_interval: Duration,
    lifecycle: Mutex<Lifecycle>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl JobService {
    /// Wire a service from configuration and a dispatch table.
    ///
    /// Every category the dispatch table serves must have an admission
    /// capacity; the workers are not started.
    pub fn new(config: &JobGateConfig, dispatch: DispatchTable) -> Result<Self, QueueError> {
        let capacities = config.capacity_table()?;
        let uncapped: Vec<String> = dispatch
            .categories()
            .into_iter()
            .filter(|category| !capacities.contains_key(category))
            .map(|category| category.to_string())
            .collect();
        if !uncapped.is_empty() {
            return Err(QueueError::ConfigError(format!(
                "No admission capacity configured for: {}",
                uncapped.join(", ")
            )));
        }
        if config.workers.count == 0 {
            return Err(QueueError::ConfigError(
                "At least one worker is required".to_string(),
            ));
        }

        let eviction_max_age = match config.eviction.max_age_secs {
            0 => None,
            secs => Some(
                chrono::Duration::from_std(Duration::from_secs(secs)).map_err(|e| {
                    QueueError::ConfigError(format!("Eviction age out of range: {}", e))
                })?,
            ),
        };

        let store = Arc::new(JobStore::new());
        let queue = Arc::new(FifoQueue::new());
        let gate = Arc::new(AdmissionGate::new(&capacities)?);
        let dispatch = Arc::new(dispatch);

        let pool = WorkerPool::new(
            WorkerContext {
                store: Arc::clone(&store),
                queue: Arc::clone(&queue),
                gate: Arc::clone(&gate),
                dispatch: Arc::clone(&dispatch),
            },
            config.workers.count,
        );

        Ok(Self {
            store,
            queue,
            gate,
            dispatch,
            pool,
            eviction_max_age,
            sweep_interval: Duration::from_secs(config.eviction.sweep_interval_secs.max(1)),
            lifecycle: Mutex::new(Lifecycle::Idle),
            sweeper: Mutex::new(None),
        })
    }

    /// Submit a job by category name.
    ///
    /// Fails with `UnknownCategory` without creating a record when the name
    /// is not a served category.
    pub fn enqueue(
        &self,
        category: &str,
        owner: &str,
        input: JobInput,
    ) -> Result<JobId, QueueError> {
        let category = Category::from_str(category)?;
        self.enqueue_typed(category, owner, input)
    }

    pub fn enqueue_typed(
        &self,
        category: Category,
        owner: &str,
        input: JobInput,
    ) -> Result<JobId, QueueError> {
        if *self.lifecycle.lock() == Lifecycle::Stopped {
            return Err(QueueError::ShutDown);
        }
        if !self.dispatch.contains(category) {
            warn!(category = %category, "Rejected job for unregistered category");
            return Err(QueueError::UnknownCategory(category.to_string()));
        }

        let id = self.store.create(category, owner, input);
        self.queue.push(id);
        debug!(job_id = %id, category = %category, owner, "Enqueued job");
        Ok(id)
    }

    /// Current state of a job, with its queue position while pending
    pub fn status(&self, id: JobId) -> Result<JobStatusReport, QueueError> {
        let record = self.store.get(id).ok_or(QueueError::NotFound(id))?;
        let position = if record.status().is_terminal() {
            None
        } else {
            self.queue.position(id)
        };
        Ok(JobStatusReport::from_record(&record, position))
    }

    /// Like [`status`](Self::status), but only for the job's owner
    pub fn status_for_owner(&self, id: JobId, owner: &str) -> Result<JobStatusReport, QueueError> {
        let record = self.store.get(id).ok_or(QueueError::NotFound(id))?;
        if record.owner != owner {
            return Err(QueueError::Forbidden(id));
        }
        self.status(id)
    }

    /// Start the workers and, when eviction is enabled, the sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), QueueError> {
        let mut lifecycle = self.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Running => return Err(QueueError::AlreadyRunning),
            Lifecycle::Stopped => return Err(QueueError::ShutDown),
            Lifecycle::Idle => {}
        }

        self.pool.start();
        if let Some(max_age) = self.eviction_max_age {
            *self.sweeper.lock() = Some(self.spawn_sweeper(max_age));
        }
        *lifecycle = Lifecycle::Running;

        info!(
            workers = self.pool.worker_count(),
            categories = self.dispatch.len(),
            "Job service started"
        );
        Ok(())
    }

    /// Stop workers and sweeper, then close the admission gates.
    ///
    /// Jobs still queued stay pending; jobs in flight stay processing.
    /// The service cannot be restarted.
    pub async fn shutdown(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if *lifecycle == Lifecycle::Stopped {
                return;
            }
            *lifecycle = Lifecycle::Stopped;
        }

        let sweeper = self.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            sweeper.cancel.cancel();
            if let Err(e) = sweeper.handle.await {
                if e.is_panic() {
                    error!(error = %e, "Eviction sweeper panicked");
                }
            }
        }
        self.pool.shutdown().await;
        self.gate.close();

        info!(
            abandoned_in_queue = self.queue.len(),
            "Job service stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        *self.lifecycle.lock() == Lifecycle::Running
    }

    pub fn stats(&self) -> QueueStats {
        self.store.stats()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Categories this service accepts
    pub fn categories(&self) -> Vec<Category> {
        self.dispatch.categories()
    }

    /// Admission slots currently held for `category`
    pub fn in_flight(&self, category: Category) -> Option<usize> {
        self.gate.in_flight(category)
    }

    /// Wait until no job is pending or processing.
    ///
    /// Returns `false` if `timeout` elapses first.
    pub async fn wait_for_idle(&self, timeout: Option<Duration>) -> bool {
        let start = Instant::now();
        loop {
            let stats = self.store.stats();
            if stats.pending == 0 && stats.processing == 0 {
                return true;
            }

            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    return false;
                }
            }

            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Drop finished records older than `older_than`
    pub fn evict_finished(&self, older_than: chrono::Duration) -> usize {
        self.store.evict_finished(older_than)
    }

    fn spawn_sweeper(&self, max_age: chrono::Duration) -> Sweeper {
        let cancel = CancellationToken::new();
        let store = Arc::clone(&self.store);
        let interval = self.sweep_interval;
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = store.evict_finished(max_age);
                        if evicted > 0 {
                            info!(evicted, "Swept finished job records");
                        }
                    }
                }
            }
        });

        Sweeper { cancel, handle }
    }
}

impl Drop for JobService {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.cancel.cancel();
        }
    }
}
