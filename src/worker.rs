//! Worker Pool
//!
//! A fixed number of tokio tasks, each looping: dequeue an id, resolve the
//! backend, take the category's admission slot, run the backend, record the
//! outcome. A worker suspended on a saturated gate or a slow backend does not
//! dequeue anything else, which is what throttles a busy category.
//!
//! Nothing that happens while processing one job may end the loop. Backend
//! errors and panics become failed records; there is no retry.

use crate::dispatch::DispatchTable;
use crate::error::BackendError;
use crate::gate::AdmissionGate;
use crate::queue::FifoQueue;
use crate::store::JobStore;
use crate::types::JobId;
use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shared handles every worker needs
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<JobStore>,
    pub queue: Arc<FifoQueue>,
    pub gate: Arc<AdmissionGate>,
    pub dispatch: Arc<DispatchTable>,
}

pub struct WorkerPool {
    context: WorkerContext,
    worker_count: usize,
    cancel: Mutex<CancellationToken>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(context: WorkerContext, worker_count: usize) -> Self {
        Self {
            context,
            worker_count,
            cancel: Mutex::new(CancellationToken::new()),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the worker tasks. Calling it on a running pool is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut workers = self.workers.lock();
        if !workers.is_empty() {
            return;
        }

        let cancel = {
            let mut guard = self.cancel.lock();
            if guard.is_cancelled() {
                *guard = CancellationToken::new();
            }
            guard.clone()
        };

        for worker_id in 0..self.worker_count {
            let context = self.context.clone();
            let cancel = cancel.clone();
            workers.push(tokio::spawn(async move {
                Self::worker_loop(worker_id, context, cancel).await;
            }));
        }

        info!(worker_count = workers.len(), "Started job worker pool");
    }

    /// Cancel every worker and wait for them to exit.
    ///
    /// A job whose backend call is in flight is abandoned: its future is
    /// dropped, its admission slot is released and its record stays
    /// `processing`.
    pub async fn shutdown(&self) {
        self.cancel.lock().cancel();
        let workers = std::mem::take(&mut *self.workers.lock());
        if workers.is_empty() {
            return;
        }

        for handle in workers {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!(error = %e, "Worker task panicked during shutdown");
                }
            }
        }
        info!("Stopped job worker pool");
    }

    pub fn is_running(&self) -> bool {
        !self.workers.lock().is_empty()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    async fn worker_loop(worker_id: usize, context: WorkerContext, cancel: CancellationToken) {
        debug!(worker_id, "Worker started");

        loop {
            let id = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                id = context.queue.pop() => id,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(worker_id, job_id = %id, "Worker cancelled while running job");
                    break;
                }
                _ = Self::process_job(worker_id, &context, id) => {}
            }
        }

        debug!(worker_id, "Worker stopped");
    }

    /// Run one job to a terminal state. This is the only place backends are called.
    async fn process_job(worker_id: usize, context: &WorkerContext, id: JobId) {
        let Some(record) = context.store.get(id) else {
            warn!(worker_id, job_id = %id, "Dequeued job id has no record, skipping");
            return;
        };

        let Some(backend) = context.dispatch.resolve(record.category) else {
            error!(worker_id, job_id = %id, category = %record.category, "No backend registered for category");
            Self::record_failure(context, id, format!("Unknown job category: {}", record.category));
            return;
        };

        let permit = match context.gate.acquire(record.category).await {
            Ok(permit) => permit,
            Err(e) => {
                error!(worker_id, job_id = %id, error = %e, "Failed to acquire admission slot");
                Self::record_failure(context, id, e.to_string());
                return;
            }
        };

        if let Err(e) = context.store.set_processing(id) {
            warn!(worker_id, job_id = %id, error = %e, "Job could not enter processing, skipping");
            return;
        }

        debug!(
            worker_id,
            job_id = %id,
            category = %record.category,
            backend = backend.name(),
            "Processing job"
        );

        let start = Instant::now();
        let outcome = AssertUnwindSafe(backend.generate(&record.owner, &record.input))
            .catch_unwind()
            .await;
        drop(permit);
        let duration_ms = start.elapsed().as_millis() as u64;

        let outcome = outcome.unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(BackendError::Panicked(message))
        });

        match outcome {
            Ok(result) => {
                if let Err(e) = context.store.set_completed(id, result) {
                    warn!(worker_id, job_id = %id, error = %e, "Could not record job completion");
                    return;
                }
                info!(worker_id, job_id = %id, category = %record.category, duration_ms, "Job completed");
            }
            Err(e) => {
                error!(
                    worker_id,
                    job_id = %id,
                    category = %record.category,
                    duration_ms,
                    error = %e,
                    "Job failed"
                );
                Self::record_failure(context, id, e.to_string());
            }
        }
    }

    fn record_failure(context: &WorkerContext, id: JobId, message: String) {
        if let Err(e) = context.store.set_failed(id, message) {
            warn!(job_id = %id, error = %e, "Could not record job failure");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.cancel.get_mut().cancel();
    }
}
