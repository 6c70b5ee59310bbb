//! # db-bench
//!
//! Benchmark orchestration harness for a key-value storage engine.
//!
//! Drives a fixed menu of named benchmarks (sequential writes, writes with
//! background compaction, reads from the write buffer and from compacted
//! tables, and parallel variants) and reports throughput for each.
//!
//! ## Architecture
//!
//! ```text
//! run_suite ──dispatch(name, par, body)──→ Dispatcher
//!                                            │ filter / list / execute
//!                                            ↓
//!                                        BenchHandle ──→ Engine (port)
//!                                         ↑       ↑
//!                          run_parallel ──┘       └── CompactionDaemon
//!                          (N workers, join)          (own thread, stop handshake)
//! ```
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Configuration, errors, handle lifecycle, operation accounting
//! - `ports/` - `Engine`, `EngineFactory` and `Reporter` traits
//! - `service/` - Dispatcher, handle, fan-out, daemon, suite
//! - `adapters/` - In-memory engine, recording engine, console reporters
//!
//! ## Guarantees
//!
//! | Guarantee | Where |
//! |-----------|-------|
//! | Filtered-out benchmarks have no side effects | `Dispatcher::dispatch` |
//! | List mode never runs a body or opens an engine | `Dispatcher::dispatch` |
//! | The join returns only after every worker reported | `run_parallel` |
//! | Daemon stop returns exactly the completed compactions | `CompactionDaemon::stop` |
//! | A handle finishes at most once | `BenchHandle::finish` |
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use db_bench::{run_suite, ConsoleReporter, Dispatcher, MemoryEngineFactory, RunConfig};
//!
//! let config = RunConfig::default().with_filter("reads")?.with_kiters(10);
//! let dispatcher = Dispatcher::new(
//!     config,
//!     Arc::new(MemoryEngineFactory::new()),
//!     Arc::new(ConsoleReporter::new()),
//! );
//! run_suite(&dispatcher)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export key types for convenience
pub use adapters::{
    CaptureReporter, CapturedLine, ConsoleReporter, EngineCall, MemoryEngine,
    MemoryEngineFactory, RecordingEngine, RecordingFactory,
};
pub use domain::config::{compile_filter, RunConfig};
pub use domain::errors::{BenchError, ConfigError, EngineError};
pub use domain::lifecycle::HandleState;
pub use domain::stats::{BenchSummary, OpOutcome, WorkerStats};
pub use ports::outbound::{Engine, EngineFactory, OpenOptions, Reporter};
pub use service::{
    benchmark_names, run_parallel, run_suite, BenchHandle, CompactionDaemon, DispatchOutcome,
    Dispatcher,
};
