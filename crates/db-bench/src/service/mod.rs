//! # Benchmark Service
//!
//! Scheduling and coordination: the per-benchmark handle, the dispatcher
//! that filters and runs benchmarks, the fan-out runner, the background
//! compaction daemon, and the fixed suite built from them.

pub mod daemon;
pub mod dispatcher;
pub mod fanout;
pub mod handle;
pub mod suite;

pub use daemon::CompactionDaemon;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use fanout::run_parallel;
pub use handle::BenchHandle;
pub use suite::{benchmark_names, run_suite};
