//! Generation Backend Abstraction
//!
//! Uniform "execute" capability for the external services that perform the
//! long-running generation work of one category. The worker pool is the only
//! caller.

use crate::error::BackendError;
use crate::types::{JobInput, JobOutput};
use async_trait::async_trait;
use serde_json::json;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run the generation for `owner` with the job's stored input
    async fn generate(&self, owner: &str, input: &JobInput) -> Result<JobOutput, BackendError>;

    /// Name used in logs
    fn name(&self) -> &str {
        "backend"
    }
}

/// Adapts an async closure into a [`GenerationBackend`]
pub struct FnBackend<F> {
    name: String,
    f: F,
}

impl<F, Fut> FnBackend<F>
where
    F: Fn(String, JobInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<JobOutput, BackendError>> + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> GenerationBackend for FnBackend<F>
where
    F: Fn(String, JobInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<JobOutput, BackendError>> + Send,
{
    async fn generate(&self, owner: &str, input: &JobInput) -> Result<JobOutput, BackendError> {
        (self.f)(owner.to_string(), input.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Stand-in backend that sleeps, then returns an incrementing counter.
///
/// Every `fail_every`-th call fails with a provider-style message instead.
/// A `generation_name` that is not a string is rejected before any work.
pub struct SimulatedBackend {
    name: String,
    latency: Duration,
    fail_every: Option<u64>,
    calls: AtomicU64,
}

impl SimulatedBackend {
    pub fn new(name: impl Into<String>, latency: Duration) -> Self {
        Self {
            name: name.into(),
            latency,
            fail_every: None,
            calls: AtomicU64::new(0),
        }
    }

    pub fn failing_every(mut self, every: u64) -> Self {
        self.fail_every = if every == 0 { None } else { Some(every) };
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for SimulatedBackend {
    async fn generate(&self, owner: &str, input: &JobInput) -> Result<JobOutput, BackendError> {
        let generation_name = match input.get("generation_name") {
            None => json!(null),
            Some(name) if name.is_string() => name.clone(),
            Some(_) => {
                return Err(BackendError::InvalidInput(
                    "generation_name must be a string".to_string(),
                ))
            }
        };

        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.latency).await;

        if let Some(every) = self.fail_every {
            if call % every == 0 {
                return Err(BackendError::from_provider_message(
                    "You have exceeded your GPU quota",
                ));
            }
        }

        Ok(json!({
            "counter": call,
            "owner": owner,
            "generation_name": generation_name,
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
