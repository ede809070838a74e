//! CLI presentation: render config and simulation results as text tables or JSON.

use crate::category::Category;
use crate::config::JobGateConfig;
use crate::error::QueueError;
use crate::job::{JobStatus, JobStatusReport};
use crate::store::QueueStats;
use comfy_table::Table;
use serde::Serialize;

/// Outcome of a `simulate` run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub category: Category,
    pub capacity: usize,
    pub workers: usize,
    /// Highest number of simultaneously held admission slots observed
    pub peak_in_flight: usize,
    pub elapsed_ms: u128,
    pub interrupted: bool,
    pub stats: QueueStats,
    pub jobs: Vec<JobStatusReport>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, QueueError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| QueueError::ConfigError(format!("Failed to serialize output: {}", e)))
}

pub fn format_config(config: &JobGateConfig, format: &str) -> Result<String, QueueError> {
    if format == "json" {
        return to_json(config);
    }

    let mut out = String::new();
    out.push_str(&format!("Workers: {}\n", config.workers.count));
    if config.eviction.max_age_secs == 0 {
        out.push_str("Eviction: disabled\n");
    } else {
        out.push_str(&format!(
            "Eviction: finished jobs older than {}s (sweep every {}s)\n",
            config.eviction.max_age_secs, config.eviction.sweep_interval_secs
        ));
    }
    out.push_str(&format!(
        "Logging: level={} format={} output={}\n\n",
        config.logging.level, config.logging.format, config.logging.output
    ));

    let mut rows: Vec<(Category, usize)> = config.capacity_table()?.into_iter().collect();
    rows.sort();

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Category", "Capacity"]);
    for (category, capacity) in rows {
        table.add_row(vec![category.to_string(), capacity.to_string()]);
    }
    out.push_str(&table.to_string());
    Ok(out)
}

pub fn format_simulation(summary: &SimulationSummary, format: &str) -> Result<String, QueueError> {
    if format == "json" {
        return to_json(summary);
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Job", "Status", "Outcome", "Run (ms)"]);
    for job in &summary.jobs {
        let outcome = match job.status {
            JobStatus::Completed => job
                .result
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default(),
            JobStatus::Failed => job.error.clone().unwrap_or_default(),
            JobStatus::Pending | JobStatus::Processing => "-".to_string(),
        };
        let run_ms = match (job.started_at, job.finished_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds().to_string(),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            job.id.to_string(),
            job.status.to_string(),
            outcome,
            run_ms,
        ]);
    }

    let mut out = table.to_string();
    out.push_str(&format!(
        "\n\n{} jobs in {} (capacity {}, {} workers) finished in {} ms\n",
        summary.jobs.len(),
        summary.category,
        summary.capacity,
        summary.workers,
        summary.elapsed_ms
    ));
    out.push_str(&format!(
        "completed: {}  failed: {}  pending: {}  processing: {}\n",
        summary.stats.completed,
        summary.stats.failed,
        summary.stats.pending,
        summary.stats.processing
    ));
    out.push_str(&format!("peak in flight: {}", summary.peak_in_flight));
    if summary.interrupted {
        out.push_str("\ninterrupted before all jobs finished");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_table_lists_every_category() {
        let rendered = format_config(&JobGateConfig::default(), "text").unwrap();
        for category in Category::ALL {
            assert!(rendered.contains(category.as_str()));
        }
        assert!(rendered.contains("Workers: 4"));
    }

    #[test]
    fn config_json_round_trips_worker_count() {
        let rendered = format_config(&JobGateConfig::default(), "json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["workers"]["count"], 4);
    }

    #[test]
    fn empty_simulation_renders_summary() {
        let summary = SimulationSummary {
            category: Category::ImageTo3d,
            capacity: 2,
            workers: 4,
            peak_in_flight: 0,
            elapsed_ms: 0,
            interrupted: false,
            stats: QueueStats::default(),
            jobs: Vec::new(),
        };
        let rendered = format_simulation(&summary, "text").unwrap();
        assert!(rendered.contains("Imagen3D"));
        assert!(rendered.contains("capacity 2"));
    }
}
