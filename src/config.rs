//! Configuration System
//!
//! Layered configuration for the job queue: merge-policy defaults, an optional
//! user-level file, workspace files and `JOBGATE__*` environment overrides.
//! Every category carries an admission capacity; a category without one is a
//! startup error.

use crate::category::Category;
use crate::error::QueueError;
use crate::gate::DEFAULT_CATEGORY_CAPACITY;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobGateConfig {
    #[serde(default)]
    pub workers: WorkerConfig,

    /// Admission capacity per category wire name
    #[serde(default = "default_capacities")]
    pub capacities: HashMap<String, usize>,

    #[serde(default)]
    pub eviction: EvictionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent worker loops
    #[serde(default = "default_worker_count")]
    pub count: usize,
}

/// Housekeeping of finished records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionConfig {
    /// Finished records older than this are dropped by the in-process
    /// sweeper. 0 (the default) leaves eviction to external callers of
    /// `evict_finished`.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

pub(crate) fn default_worker_count() -> usize {
    4
}

pub(crate) fn default_max_age_secs() -> u64 {
    0
}

pub(crate) fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_capacities() -> HashMap<String, usize> {
    Category::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), DEFAULT_CATEGORY_CAPACITY))
        .collect()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
        }
    }
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for JobGateConfig {
    fn default() -> Self {
        Self {
            workers: WorkerConfig::default(),
            capacities: default_capacities(),
            eviction: EvictionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Workers(String),
    Capacity(String, String),
    Eviction(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Workers(msg) => write!(f, "Workers: {}", msg),
            ValidationError::Capacity(name, msg) => write!(f, "Capacity '{}': {}", name, msg),
            ValidationError::Eviction(msg) => write!(f, "Eviction: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Resolve a capacity key to a category.
///
/// Environment sources lowercase keys, so names match case-insensitively.
fn category_for_key(key: &str) -> Option<Category> {
    Category::ALL
        .iter()
        .copied()
        .find(|c| c.as_str().eq_ignore_ascii_case(key.trim()))
}

impl JobGateConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.workers.count == 0 {
            errors.push(ValidationError::Workers(
                "At least one worker is required".to_string(),
            ));
        }

        let mut names: Vec<&String> = self.capacities.keys().collect();
        names.sort();
        for name in names {
            let capacity = self.capacities[name];
            if category_for_key(name).is_none() {
                errors.push(ValidationError::Capacity(
                    name.clone(),
                    "Unknown job category".to_string(),
                ));
            }
            if capacity == 0 {
                errors.push(ValidationError::Capacity(
                    name.clone(),
                    "Capacity must be at least 1".to_string(),
                ));
            }
        }

        if self.eviction.max_age_secs > 0 && self.eviction.sweep_interval_secs == 0 {
            errors.push(ValidationError::Eviction(
                "Sweep interval must be at least 1 second when eviction is enabled".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Rewrite known capacity keys to their canonical names and give every
    /// category without an entry the default capacity. Unknown keys are left
    /// for `validate` to report.
    pub(crate) fn normalize_capacities(&mut self) {
        let mut normalized = HashMap::with_capacity(self.capacities.len());
        for (name, capacity) in self.capacities.drain() {
            match category_for_key(&name) {
                Some(category) => {
                    normalized.insert(category.as_str().to_string(), capacity);
                }
                None => {
                    normalized.insert(name, capacity);
                }
            }
        }
        for category in Category::ALL {
            normalized
                .entry(category.as_str().to_string())
                .or_insert(DEFAULT_CATEGORY_CAPACITY);
        }
        self.capacities = normalized;
    }

    /// Capacity table keyed by typed category
    pub fn capacity_table(&self) -> Result<HashMap<Category, usize>, QueueError> {
        let mut table = HashMap::with_capacity(self.capacities.len());
        for (name, &capacity) in &self.capacities {
            let category = category_for_key(name)
                .ok_or_else(|| QueueError::UnknownCategory(name.clone()))?;
            table.insert(category, capacity);
        }
        Ok(table)
    }

    /// Validate and flatten errors into one `QueueError`
    pub fn validated(self) -> Result<Self, QueueError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            QueueError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }
}
