//! # Benchmark Dispatcher
//!
//! Decides, per named benchmark, whether to skip it, list it, or run it.
//!
//! ```text
//! dispatch(name, par, body)
//!     │
//!     ├── filter rejects name ──→ Skipped   (no output, engine never opened)
//!     ├── list-only           ──→ Listed    (name printed, body never run)
//!     └── otherwise:
//!           open engine → BenchHandle::new → body(&handle)
//!             → finish (unless the body already did) → stop → Executed
//! ```
//!
//! A body error aborts the dispatch and is returned to the caller; the driver
//! treats it as fatal to the whole run.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::domain::config::RunConfig;
use crate::domain::errors::BenchError;
use crate::domain::stats::BenchSummary;
use crate::ports::outbound::{EngineFactory, OpenOptions, Reporter};
use crate::service::handle::BenchHandle;

/// What `dispatch` did with a benchmark.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Name filtered out.
    Skipped,
    /// Name printed in list-only mode.
    Listed,
    /// Body ran to completion.
    Executed(BenchSummary),
}

/// Runs named benchmarks against engines opened from a factory.
pub struct Dispatcher {
    config: RunConfig,
    factory: Arc<dyn EngineFactory>,
    reporter: Arc<dyn Reporter>,
}

impl Dispatcher {
    pub fn new(
        config: RunConfig,
        factory: Arc<dyn EngineFactory>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            factory,
            reporter,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Skip, list or execute one benchmark.
    pub fn dispatch<F>(
        &self,
        name: &str,
        parallelism: usize,
        body: F,
    ) -> Result<DispatchOutcome, BenchError>
    where
        F: FnOnce(&BenchHandle) -> Result<(), BenchError>,
    {
        if !self.config.matches(name) {
            debug!(benchmark = name, "Filtered out");
            return Ok(DispatchOutcome::Skipped);
        }
        if self.config.list_only {
            self.reporter.benchmark_listed(name);
            return Ok(DispatchOutcome::Listed);
        }
        if parallelism == 0 {
            return Err(BenchError::InvalidParallelism(parallelism));
        }

        info!(benchmark = name, parallelism, "Running benchmark");
        let engine = self.factory.open(&OpenOptions {
            dir: self.config.storage_dir.clone(),
            size: self.config.storage_size,
            workers: parallelism,
        })?;
        let handle = BenchHandle::new(name, parallelism, engine, self.reporter.clone());

        if let Err(e) = body(&handle) {
            error!(benchmark = name, error = %e, "Benchmark failed");
            if let Err(close) = handle.stop() {
                error!(benchmark = name, error = %close, "Engine release failed");
            }
            return Err(e);
        }

        let summary = match handle.summary() {
            Some(summary) if handle.is_finished() => summary,
            _ => handle.finish()?,
        };
        handle.stop()?;

        Ok(DispatchOutcome::Executed(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::console::CaptureReporter;
    use crate::adapters::recording::{EngineCall, RecordingFactory};
    use crate::domain::errors::EngineError;
    use proptest::prelude::*;
    use std::cell::Cell;

    fn dispatcher(config: RunConfig) -> (Dispatcher, Arc<RecordingFactory>, Arc<CaptureReporter>) {
        let factory = Arc::new(RecordingFactory::new());
        let reporter = Arc::new(CaptureReporter::new());
        let dispatcher = Dispatcher::new(config, factory.clone(), reporter.clone());
        (dispatcher, factory, reporter)
    }

    #[test]
    fn test_filtered_out_has_no_side_effects() {
        let config = RunConfig::default().with_filter("^table").unwrap();
        let (dispatcher, factory, reporter) = dispatcher(config);
        let ran = Cell::new(false);

        let outcome = dispatcher
            .dispatch("writes", 1, |_| {
                ran.set(true);
                Ok(())
            })
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert!(!ran.get());
        assert!(factory.opened().is_empty());
        assert!(reporter.lines().is_empty());
    }

    #[test]
    fn test_list_only_prints_name_without_running() {
        let config = RunConfig::default().with_list_only(true);
        let (dispatcher, factory, reporter) = dispatcher(config);
        let ran = Cell::new(false);

        let outcome = dispatcher
            .dispatch("rbuf reads", 1, |_| {
                ran.set(true);
                Ok(())
            })
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Listed);
        assert!(!ran.get());
        assert!(factory.opened().is_empty());
        assert_eq!(reporter.listed(), vec!["rbuf reads".to_string()]);
        assert_eq!(reporter.lines().len(), 1);
    }

    #[test]
    fn test_implicit_finish_when_body_forgets() {
        let (dispatcher, factory, reporter) = dispatcher(RunConfig::default());

        let outcome = dispatcher
            .dispatch("writes", 1, |b| {
                for _ in 0..10 {
                    b.finish_op(0, b.write(0))?;
                }
                Ok(())
            })
            .unwrap();

        let DispatchOutcome::Executed(summary) = outcome else {
            panic!("expected execution");
        };
        assert_eq!(summary.ops, 10);
        assert_eq!(reporter.summaries(), vec![summary]);

        let engine = factory.last().unwrap();
        assert_eq!(engine.count(|c| *c == EngineCall::Close), 1);
    }

    #[test]
    fn test_explicit_finish_not_repeated() {
        let (dispatcher, _, reporter) = dispatcher(RunConfig::default());

        let outcome = dispatcher
            .dispatch("write + compact", 1, |b| {
                b.finish_op(0, b.write(0))?;
                b.finish()?;
                b.note("  finished 0 compactions");
                Ok(())
            })
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Executed(ref s) if s.ops == 1));
        assert_eq!(reporter.summaries().len(), 1);
        assert_eq!(reporter.notes(), vec!["  finished 0 compactions".to_string()]);
    }

    #[test]
    fn test_body_error_is_returned() {
        let (dispatcher, _, reporter) = dispatcher(RunConfig::default());

        let err = dispatcher
            .dispatch("writes", 1, |b| {
                b.finish_op(0, Err(EngineError::operation("write", "disk full")))
            })
            .unwrap_err();

        assert!(matches!(err, BenchError::Engine(_)));
        assert!(reporter.summaries().is_empty());
    }

    #[test]
    fn test_failed_body_still_releases_engine() {
        let (dispatcher, factory, _) = dispatcher(RunConfig::default());

        dispatcher
            .dispatch("writes", 1, |b| {
                b.finish_op(0, Err(EngineError::operation("write", "disk full")))
            })
            .unwrap_err();

        let engine = factory.last().unwrap();
        assert_eq!(engine.count(|c| *c == EngineCall::Close), 1);
    }

    #[test]
    fn test_engine_opened_with_config() {
        let config = RunConfig::default()
            .with_storage_dir("/tmp/db")
            .with_storage_size(42);
        let (dispatcher, factory, _) = dispatcher(config);

        dispatcher.dispatch("table reads (par=3)", 3, |_| Ok(())).unwrap();

        let (options, _) = factory.opened().pop().unwrap();
        assert_eq!(options.dir, std::path::PathBuf::from("/tmp/db"));
        assert_eq!(options.size, 42);
        assert_eq!(options.workers, 3);
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let (dispatcher, factory, _) = dispatcher(RunConfig::default());
        let err = dispatcher.dispatch("writes", 0, |_| Ok(())).unwrap_err();
        assert!(matches!(err, BenchError::InvalidParallelism(0)));
        assert!(factory.opened().is_empty());
    }

    proptest! {
        #[test]
        fn prop_body_runs_iff_filter_matches(
            name in "[a-z +()=0-9]{0,24}",
            pattern in "[a-z]{0,3}|\\^[a-z]{1,3}|[a-z]{1,3}\\$|\\.\\*",
        ) {
            let config = RunConfig::default().with_filter(&pattern).unwrap();
            let expected = config.matches(&name);
            let (dispatcher, _, _) = dispatcher(config);
            let ran = Cell::new(false);

            dispatcher.dispatch(&name, 1, |_| {
                ran.set(true);
                Ok(())
            }).unwrap();

            let reference = regex::Regex::new(if pattern.is_empty() { ".*" } else { pattern.as_str() }).unwrap();
            prop_assert_eq!(ran.get(), expected);
            prop_assert_eq!(ran.get(), reference.is_match(&name));
        }
    }
}
