//! # Domain Errors
//!
//! Error types for the benchmark harness.
//!
//! ## Design Principles
//!
//! - Engine failures are fatal to the run; nothing here is retried
//! - Configuration errors surface before any benchmark executes
//! - Handshake and lifecycle misuse is reported, never silently ignored

use thiserror::Error;

use crate::domain::lifecycle::HandleState;

/// Errors reported by the engine under test.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{op} failed: {message}")]
    Operation { op: &'static str, message: String },

    #[error("Engine is closed")]
    Closed,

    #[error("Worker {worker} is not a lane of this engine ({workers} lanes)")]
    UnknownWorker { worker: usize, workers: usize },
}

impl EngineError {
    /// Create an operation failure.
    pub fn operation(op: &'static str, message: impl Into<String>) -> Self {
        EngineError::Operation {
            op,
            message: message.into(),
        }
    }
}

/// Errors in the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid benchmark filter {pattern}: {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Parallelism must be at least 1 (got {0})")]
    InvalidParallelism(usize),

    #[error("Database size must be at least 1 (got {0})")]
    InvalidSize(usize),
}

/// Errors raised while dispatching or executing a benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Benchmark {name:?} was already finished")]
    AlreadyFinished { name: String },

    #[error("Benchmark {name:?} cannot record operations in state {state:?}")]
    NotRecording { name: String, state: HandleState },

    #[error("Worker {worker} out of range for parallelism {parallelism}")]
    WorkerOutOfRange { worker: usize, parallelism: usize },

    #[error("Parallelism must be at least 1 (got {0})")]
    InvalidParallelism(usize),

    #[error("Lost a worker: {received} of {expected} workers reported completion")]
    WorkerLost { expected: usize, received: usize },

    #[error("Compaction daemon exited without completing the stop handshake")]
    DaemonLost,

    #[error("Failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),
}
