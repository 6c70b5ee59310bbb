//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the harness requires from its host: the engine under test and
//! somewhere to print results.
//!
//! Production: `MemoryEngine` (adapters/memory.rs), `ConsoleReporter`
//! Testing: `RecordingEngine` (adapters/recording.rs), `CaptureReporter`

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::errors::EngineError;
use crate::domain::stats::{BenchSummary, OpOutcome};

/// The engine under test.
///
/// One instance is shared by every worker and by the compaction daemon of a
/// benchmark. Implementations are responsible for their own concurrency
/// safety: `compact` may run while other threads call `read` and `write`.
pub trait Engine: Send + Sync {
    /// Perform one write attributed to `worker`.
    fn write(&self, worker: usize) -> Result<OpOutcome, EngineError>;

    /// Perform one read attributed to `worker`.
    fn read(&self, worker: usize) -> Result<OpOutcome, EngineError>;

    /// Run one compaction pass.
    fn compact(&self) -> Result<(), EngineError>;

    /// Load the benchmark dataset.
    fn fill(&self) -> Result<(), EngineError>;

    /// Reset engine-side counters, keeping the dataset.
    fn reset(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Release resources. No operation is issued after `close`.
    fn close(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Parameters for opening a fresh engine for one benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Directory the engine may keep its data in.
    pub dir: PathBuf,
    /// Number of keys loaded by `fill`.
    pub size: usize,
    /// Number of worker lanes that will issue operations.
    pub workers: usize,
}

/// Opens one engine per executed benchmark.
pub trait EngineFactory: Send + Sync {
    fn open(&self, options: &OpenOptions) -> Result<Arc<dyn Engine>, EngineError>;
}

/// Sink for benchmark console output.
pub trait Reporter: Send + Sync {
    /// A benchmark name printed in list-only mode.
    fn benchmark_listed(&self, name: &str);

    /// The summary of a finished benchmark.
    fn benchmark_finished(&self, summary: &BenchSummary);

    /// A benchmark-specific message, such as a compaction count.
    fn note(&self, message: &str);
}
