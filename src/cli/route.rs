//! CLI route: single route table and run context.

use crate::backend::SimulatedBackend;
use crate::category::Category;
use crate::cli::parse::Commands;
use crate::cli::presentation::{format_config, format_simulation, SimulationSummary};
use crate::config::{ConfigLoader, JobGateConfig};
use crate::dispatch::DispatchTable;
use crate::error::QueueError;
use crate::service::JobService;
use crate::types::{JobId, JobInput};
use serde_json::json;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: JobGateConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, QueueError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &JobGateConfig {
        &self.config
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, QueueError> {
        match command {
            Commands::Config { format } => format_config(&self.config, format),
            Commands::Simulate {
                jobs,
                category,
                latency_ms,
                fail_every,
                owner,
                timeout_secs,
                format,
            } => {
                let summary = self
                    .simulate(SimulateRequest {
                        jobs: *jobs,
                        category,
                        latency: Duration::from_millis(*latency_ms),
                        fail_every: *fail_every,
                        owner,
                        timeout: Duration::from_secs(*timeout_secs),
                    })
                    .await?;
                format_simulation(&summary, format)
            }
        }
    }

    async fn simulate(&self, request: SimulateRequest<'_>) -> Result<SimulationSummary, QueueError> {
        let category = Category::from_str(request.category)?;
        let capacity = self
            .config
            .capacity_table()?
            .get(&category)
            .copied()
            .ok_or_else(|| QueueError::UnknownCategory(category.to_string()))?;

        let backend = SimulatedBackend::new(format!("simulated-{}", category), request.latency)
            .failing_every(request.fail_every);
        let dispatch = DispatchTable::new().register(category, Arc::new(backend));
        let service = JobService::new(&self.config, dispatch)?;

        info!(
            workspace = %self.workspace_root.display(),
            category = %category,
            jobs = request.jobs,
            capacity,
            "Starting simulation"
        );

        let started = Instant::now();
        service.start()?;

        let mut ids: Vec<JobId> = Vec::with_capacity(request.jobs);
        for n in 0..request.jobs {
            let mut input = JobInput::new();
            input.insert("generation_name".into(), json!(format!("sim-{}", n + 1)));
            ids.push(service.enqueue_typed(category, request.owner, input)?);
        }

        let mut peak_in_flight = 0;
        let interrupted = tokio::select! {
            timed_out = watch_until_idle(&service, category, request.timeout, &mut peak_in_flight) => timed_out,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, shutting down workers");
                true
            }
        };
        let elapsed_ms = started.elapsed().as_millis();

        service.shutdown().await;

        let jobs = ids
            .into_iter()
            .map(|id| service.status(id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SimulationSummary {
            category,
            capacity,
            workers: self.config.workers.count,
            peak_in_flight,
            elapsed_ms,
            interrupted,
            stats: service.stats(),
            jobs,
        })
    }
}

struct SimulateRequest<'a> {
    jobs: usize,
    category: &'a str,
    latency: Duration,
    fail_every: u64,
    owner: &'a str,
    timeout: Duration,
}

/// Sample the gate until the service is idle or `timeout` passes.
///
/// Peak slot usage is written to `peak` as it is observed, so it survives the
/// future being dropped. Returns whether the wait was cut short.
async fn watch_until_idle(
    service: &JobService,
    category: Category,
    timeout: Duration,
    peak: &mut usize,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        *peak = (*peak).max(service.in_flight(category).unwrap_or(0));
        let stats = service.stats();
        if stats.pending == 0 && stats.processing == 0 {
            return false;
        }
        if Instant::now() >= deadline {
            warn!(?stats, "Simulation timed out");
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
