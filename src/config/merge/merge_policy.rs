//! Merge rules: defaults, override order, conflict handling.
//!
//! Precedence, lowest first: these defaults, the global file, the workspace
//! files, then `JOBGATE__*` environment variables.

use crate::config::{default_max_age_secs, default_sweep_interval_secs, default_worker_count};
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Capacities are not defaulted here; missing categories are filled after
/// deserialization so differently-cased keys never collide.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("workers.count", default_worker_count() as u64)?
        .set_default("eviction.max_age_secs", default_max_age_secs())?
        .set_default("eviction.sweep_interval_secs", default_sweep_interval_secs())
}
