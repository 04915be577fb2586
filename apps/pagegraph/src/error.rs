//! # CLI Errors
//!
//! Everything a command can fail with, wrapping the storage core's
//! [`GraphError`].

use pagegraph_core::GraphError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Cannot read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {option}: {value}")]
    InvalidArgument { option: &'static str, value: String },

    #[error("Cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Cannot render JSON output: {0}")]
    Json(#[from] serde_json::Error),

    /// The parallel walk saw something the single-threaded walk did not.
    #[error(
        "Parallel traversal diverged: {parallel_count} relationships (sum {parallel_sum}) vs {sequential_count} (sum {sequential_sum})"
    )]
    TraversalMismatch {
        sequential_count: u64,
        sequential_sum: f64,
        parallel_count: u64,
        parallel_sum: f64,
    },
}
