//! CLI parse: clap types for jobgate. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// jobgate CLI - in-memory job admission and execution
#[derive(Parser)]
#[command(name = "jobgate")]
#[command(about = "Admission-gated background job queue with per-category concurrency limits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where config/ is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the effective configuration
    Config {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run jobs against simulated backends and report the outcome
    Simulate {
        /// Number of jobs to enqueue
        #[arg(long, default_value_t = 5)]
        jobs: usize,
        /// Job category (e.g. Texto3D, Imagen3D)
        #[arg(long)]
        category: String,
        /// Simulated backend latency in milliseconds
        #[arg(long, default_value_t = 100)]
        latency_ms: u64,
        /// Fail every k-th backend call (0 = never)
        #[arg(long, default_value_t = 0)]
        fail_every: u64,
        /// Owner recorded on each job
        #[arg(long, default_value = "simulator")]
        owner: String,
        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
