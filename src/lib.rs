//! jobgate: In-Memory Job Admission and Execution
//!
//! Accepts long-running generation jobs tagged with a category, records them,
//! queues them in FIFO order and runs them on a pool of workers. Each category
//! has its own admission gate bounding how many of its jobs execute at once.
//! Callers poll for status by job id.

pub mod backend;
pub mod category;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod job;
pub mod logging;
pub mod queue;
pub mod service;
pub mod store;
pub mod types;
pub mod worker;

pub use backend::{FnBackend, GenerationBackend, SimulatedBackend};
pub use category::Category;
pub use config::{ConfigLoader, JobGateConfig};
pub use dispatch::DispatchTable;
pub use error::{BackendError, QueueError};
pub use job::{JobStatus, JobStatusReport};
pub use service::JobService;
pub use store::QueueStats;
pub use types::{JobId, JobInput, JobOutput};
