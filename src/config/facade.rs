//! Config facade: single entry point for loading configuration.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::JobGateConfig;
use crate::error::QueueError;
use config::Environment;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`JobGateConfig`] from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration for a workspace root.
    pub fn load(workspace_root: &Path) -> Result<JobGateConfig, QueueError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(Self::environment());

        let mut config: JobGateConfig = builder.build()?.try_deserialize()?;
        config.normalize_capacities();
        debug!(
            workspace_root = %workspace_root.display(),
            workers = config.workers.count,
            "Configuration loaded"
        );
        config.validated()
    }

    /// Load and validate configuration from one explicit file.
    ///
    /// Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<JobGateConfig, QueueError> {
        if !path.exists() {
            return Err(QueueError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(Self::environment());

        let mut config: JobGateConfig = builder.build()?.try_deserialize()?;
        config.normalize_capacities();
        config.validated()
    }

    /// Global (user-level) config file path, if one can be derived
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn environment() -> Environment {
        Environment::with_prefix("JOBGATE")
            .separator("__")
            .try_parsing(true)
    }
}
