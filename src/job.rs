//! Job records and lifecycle states.

use crate::category::Category;
use crate::types::{JobId, JobInput, JobOutput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status: `Pending -> Processing -> {Completed | Failed}`.
///
/// `Pending` is reported as `"queued"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[serde(rename = "queued")]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a job, carrying the outcome only in the matching terminal state
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Processing,
    Completed { result: JobOutput },
    Failed { error: String },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Pending => JobStatus::Pending,
            JobState::Processing => JobStatus::Processing,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// One unit of work tracked by the [`JobStore`](crate::store::JobStore)
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub category: Category,
    /// Identity-provider user id; only compared, never interpreted
    pub owner: String,
    pub input: JobInput,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(id: JobId, category: Category, owner: String, input: JobInput) -> Self {
        Self {
            id,
            category,
            owner,
            input,
            state: JobState::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn result(&self) -> Option<&JobOutput> {
        match &self.state {
            JobState::Completed { result } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Answer to a status query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusReport {
    pub id: JobId,
    pub category: Category,
    pub status: JobStatus,
    /// Advisory 1-based offset in the queued backlog; only for pending jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatusReport {
    pub fn from_record(record: &JobRecord, position: Option<usize>) -> Self {
        let status = record.status();
        Self {
            id: record.id,
            category: record.category,
            status,
            position: if status == JobStatus::Pending {
                position
            } else {
                None
            },
            result: record.result().cloned(),
            error: record.error().map(str::to_string),
            created_at: record.created_at,
            started_at: record.started_at,
            finished_at: record.finished_at,
        }
    }
}
