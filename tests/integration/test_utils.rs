//! Shared helpers for integration tests

use jobgate::{
    BackendError, Category, DispatchTable, FnBackend, JobGateConfig, JobInput, JobService,
    QueueStats,
};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Config with `capacity` slots for `category` and `workers` workers
pub fn config_with(category: Category, capacity: usize, workers: usize) -> JobGateConfig {
    let mut config = JobGateConfig::default();
    config
        .capacities
        .insert(category.as_str().to_string(), capacity);
    config.workers.count = workers;
    config.eviction.max_age_secs = 0;
    config
}

pub fn input(name: &str) -> JobInput {
    let mut input = JobInput::new();
    input.insert("generation_name".into(), json!(name));
    input
}

/// Counts concurrent and total invocations of a backend
#[derive(Default)]
pub struct Probe {
    pub current: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl Probe {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Backend that sleeps `latency` and returns an incrementing counter, recording concurrency in `probe`
pub fn counting_backend(
    latency: Duration,
    probe: Arc<Probe>,
) -> FnBackend<impl Fn(String, JobInput) -> BoxFuture<'static, Result<Value, BackendError>> + Send + Sync>
{
    FnBackend::new("counting", move |_owner: String, _input: JobInput| {
        let probe = Arc::clone(&probe);
        async move {
            let now = probe.current.fetch_add(1, Ordering::SeqCst) + 1;
            probe.peak.fetch_max(now, Ordering::SeqCst);
            let counter = probe.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(latency).await;
            probe.current.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, BackendError>(json!({ "counter": counter }))
        }
        .boxed()
    })
}

pub fn service_for(
    category: Category,
    backend: Arc<dyn jobgate::GenerationBackend>,
    config: &JobGateConfig,
) -> JobService {
    let dispatch = DispatchTable::new().register(category, backend);
    JobService::new(config, dispatch).unwrap()
}

/// Poll until idle, returning the highest `processing` count seen
pub async fn watch_processing(service: &JobService, timeout: Duration) -> (usize, QueueStats) {
    let deadline = Instant::now() + timeout;
    let mut peak = 0;
    loop {
        let stats = service.stats();
        peak = peak.max(stats.processing);
        if stats.pending == 0 && stats.processing == 0 {
            return (peak, stats);
        }
        assert!(Instant::now() < deadline, "timed out: {:?}", stats);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
