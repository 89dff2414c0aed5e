//! perfrun - Performance test invocation engine
//!
//! Executes a unit of work repeatedly, either for a fixed number of
//! invocations or for a fixed duration, on one or more staggered workers,
//! while a tracker records latencies once the warm-up period is over.

use thiserror::Error;

pub mod config;
pub mod invoke;
pub mod models;
pub mod runner;
pub mod timing;
pub mod tracker;
pub mod util;

pub use config::ExecutionConfig;
pub use invoke::{BoxError, FnInvoker, Invoker};
pub use perf_test::PerfTest;
pub use tracker::{LatencyTracker, PerformanceTracker};

// Common error types
#[derive(Debug, Error)]
pub enum PerfRunError {
    /// Configuration is inconsistent; raised before any invocation
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The run finished but violated a runtime expectation
    #[error("Execution error: {0}")]
    ExecutionError(String),
    /// The wrapped unit of work failed
    #[error("Invocation of '{invoker}' failed: {source}")]
    InvocationFailed {
        invoker: String,
        #[source]
        source: BoxError,
    },
    /// A worker thread could not be spawned or panicked
    #[error("Worker error: {0}")]
    WorkerError(String),
    /// I/O operation failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Configuration or snapshot persistence error
    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl From<serde_json::Error> for PerfRunError {
    fn from(err: serde_json::Error) -> Self {
        PerfRunError::PersistenceError(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for PerfRunError {
    fn from(err: toml::de::Error) -> Self {
        PerfRunError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for PerfRunError {
    fn from(err: toml::ser::Error) -> Self {
        PerfRunError::PersistenceError(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for perfrun operations
pub type Result<T> = std::result::Result<T, PerfRunError>;

/// Error handling utilities
pub mod error {
    use super::PerfRunError;

    /// Check if an error is worth retrying.
    ///
    /// Runs are never retried automatically: a configuration problem stays a
    /// problem and a failed invocation terminates its worker. Only transient
    /// I/O errors while loading configuration qualify.
    pub fn is_retryable_error(error: &PerfRunError) -> bool {
        match error {
            PerfRunError::IoError(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            PerfRunError::ConfigError(_)
            | PerfRunError::ExecutionError(_)
            | PerfRunError::InvocationFailed { .. }
            | PerfRunError::WorkerError(_)
            | PerfRunError::PersistenceError(_) => false,
        }
    }

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &PerfRunError) -> String {
        match error {
            PerfRunError::ConfigError(msg) => {
                format!(
                    "Configuration error: {}. Set either a positive duration or a non-negative invocation count, and keep ramp-up shorter than the duration.",
                    msg
                )
            }
            PerfRunError::ExecutionError(msg) => {
                format!(
                    "{}. Reduce the warm-up or increase the duration/invocation count.",
                    msg
                )
            }
            PerfRunError::InvocationFailed { invoker, .. } => {
                format!("The test '{}' failed during execution: {}", invoker, error)
            }
            PerfRunError::WorkerError(_) => {
                "A worker thread crashed. Check the test for panics.".to_string()
            }
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "perfrun";
pub const CONFIG_FILE: &str = "perfrun.toml";
pub const WORKER_THREAD_PREFIX: &str = "perfrun-worker";
