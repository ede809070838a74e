//! Job Record Store
//!
//! Volatile table of job records keyed by [`JobId`]. It is the single source of
//! truth for status, result and error. Each mutation touches exactly one record
//! under a short write lock, so concurrent workers never block on each other's
//! jobs.

use crate::category::Category;
use crate::error::QueueError;
use crate::job::{JobRecord, JobState, JobStatus};
use crate::types::{JobId, JobInput, JobOutput};
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Counts of records by status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct JobStore {
    records: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending record and return its fresh id
    pub fn create(&self, category: Category, owner: &str, input: JobInput) -> JobId {
        let id = JobId::next();
        let record = JobRecord::new(id, category, owner.to_string(), input);
        self.records.write().insert(id, record);
        debug!(job_id = %id, category = %category, "Created job record");
        id
    }

    /// Snapshot of one record
    pub fn get(&self, id: JobId) -> Option<JobRecord> {
        self.records.read().get(&id).cloned()
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.records.read().contains_key(&id)
    }

    pub fn set_processing(&self, id: JobId) -> Result<(), QueueError> {
        self.transition(id, JobStatus::Processing, |record| {
            if record.status() != JobStatus::Pending {
                return false;
            }
            record.state = JobState::Processing;
            record.started_at = Some(Utc::now());
            true
        })
    }

    pub fn set_completed(&self, id: JobId, result: JobOutput) -> Result<(), QueueError> {
        self.transition(id, JobStatus::Completed, move |record| {
            if record.status().is_terminal() {
                return false;
            }
            record.state = JobState::Completed { result };
            record.finished_at = Some(Utc::now());
            true
        })
    }

    pub fn set_failed(&self, id: JobId, error: impl Into<String>) -> Result<(), QueueError> {
        let error = error.into();
        self.transition(id, JobStatus::Failed, move |record| {
            if record.status().is_terminal() {
                return false;
            }
            record.state = JobState::Failed { error };
            record.finished_at = Some(Utc::now());
            true
        })
    }

    /// Apply one mutation to one record. `apply` returns false when the
    /// transition is not allowed from the record's current state.
    fn transition<F>(&self, id: JobId, to: JobStatus, apply: F) -> Result<(), QueueError>
    where
        F: FnOnce(&mut JobRecord) -> bool,
    {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or(QueueError::NotFound(id))?;
        let from = record.status();
        if apply(record) {
            Ok(())
        } else {
            drop(records);
            warn!(job_id = %id, %from, %to, "Rejected job state transition");
            Err(QueueError::InvalidTransition { id, from, to })
        }
    }

    pub fn stats(&self) -> QueueStats {
        let records = self.records.read();
        let mut stats = QueueStats::default();
        for record in records.values() {
            match record.status() {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Drop terminal records that finished more than `older_than` ago.
    ///
    /// Pending and processing records are never evicted. An age reaching
    /// past the representable time range evicts nothing.
    pub fn evict_finished(&self, older_than: chrono::Duration) -> usize {
        let Some(cutoff) = Utc::now().checked_sub_signed(older_than) else {
            warn!(
                older_than_secs = older_than.num_seconds(),
                "Eviction age out of range, nothing evicted"
            );
            return 0;
        };
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, record| match record.finished_at {
            Some(finished) if record.status().is_terminal() => finished > cutoff,
            _ => true,
        });
        let evicted = before - records.len();
        if evicted > 0 {
            debug!(evicted, remaining = records.len(), "Evicted finished job records");
        }
        evicted
    }
}
