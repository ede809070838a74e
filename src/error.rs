//! Error types for the job admission and execution subsystem.

use crate::category::Category;
use crate::job::JobStatus;
use crate::types::JobId;
use thiserror::Error;

/// Errors surfaced synchronously to callers of the queue and to startup code
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("Unknown job category: {0}")]
    UnknownCategory(String),

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {0} belongs to another owner")]
    Forbidden(JobId),

    #[error("Invalid transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Admission gate closed for category {0}")]
    GateClosed(Category),

    #[error("Job service is already running")]
    AlreadyRunning,

    #[error("Job service has been shut down")]
    ShutDown,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for QueueError {
    fn from(err: config::ConfigError) -> Self {
        QueueError::ConfigError(err.to_string())
    }
}

/// Failures raised by generation backends.
///
/// These never reach a polling caller as errors; the worker pool records
/// their message on the failed job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("GPU quota exceeded, please try again later")]
    QuotaExceeded,

    #[error("No GPU capacity available right now, please try again later")]
    NoCapacityAvailable,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Failed(String),

    #[error("Backend panicked: {0}")]
    Panicked(String),
}

const QUOTA_MARKER: &str = "exceeded your gpu quota";
const NO_GPU_MARKERS: &[&str] = &["no gpu", "gpu unavailable", "no available gpu"];

impl BackendError {
    /// Translate a raw message from a model-serving provider into a descriptive failure.
    ///
    /// Quota exhaustion and missing GPU capacity get dedicated variants; anything
    /// else is kept verbatim. Empty messages become a generic failure text so a
    /// failed job always carries a non-empty error.
    pub fn from_provider_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        if lowered.contains(QUOTA_MARKER) {
            return BackendError::QuotaExceeded;
        }
        if NO_GPU_MARKERS.iter().any(|m| lowered.contains(m)) {
            return BackendError::NoCapacityAvailable;
        }
        if message.trim().is_empty() {
            return BackendError::Failed("generation failed without a message".to_string());
        }
        BackendError::Failed(message)
    }
}
