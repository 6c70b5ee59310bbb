//! # Bench Handle
//!
//! Per-benchmark context wrapping the engine under test.
//!
//! Each worker lane owns one stats slot, indexed by worker id, so workers
//! never contend on each other's counters. The clock starts when the handle is
//! constructed and restarts on `reset`, which lets a body exclude `fill` and
//! setup compactions from the measured window.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

use crate::domain::errors::{BenchError, EngineError};
use crate::domain::lifecycle::HandleState;
use crate::domain::stats::{BenchSummary, OpOutcome, WorkerStats};
use crate::ports::outbound::{Engine, Reporter};

/// Context handed to a benchmark body.
pub struct BenchHandle {
    name: String,
    parallelism: usize,
    engine: Arc<dyn Engine>,
    reporter: Arc<dyn Reporter>,
    /// One slot per worker id.
    workers: Vec<Mutex<WorkerStats>>,
    /// Foreground compactions since the last reset.
    compactions: AtomicU64,
    started_at: Mutex<Instant>,
    state: Mutex<HandleState>,
    /// Mirrors `state.is_finished()` for the per-operation fast path.
    finished: AtomicBool,
    /// Mirrors `state != Created`.
    active: AtomicBool,
    summary: Mutex<Option<BenchSummary>>,
}

impl BenchHandle {
    /// Create a handle for one execution of `name`. The clock starts now.
    pub fn new(
        name: impl Into<String>,
        parallelism: usize,
        engine: Arc<dyn Engine>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let workers = (0..parallelism.max(1))
            .map(|_| Mutex::new(WorkerStats::default()))
            .collect();
        Self {
            name: name.into(),
            parallelism,
            engine,
            reporter,
            workers,
            compactions: AtomicU64::new(0),
            started_at: Mutex::new(Instant::now()),
            state: Mutex::new(HandleState::Created),
            finished: AtomicBool::new(false),
            active: AtomicBool::new(false),
            summary: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// The shared engine, for collaborators that need their own reference
    /// (the compaction daemon).
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub fn state(&self) -> HandleState {
        *self.state.lock()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// When the measured window began.
    pub fn started_at(&self) -> Instant {
        *self.started_at.lock()
    }

    /// Counters recorded so far by one worker.
    pub fn worker_stats(&self, worker: usize) -> Option<WorkerStats> {
        self.workers.get(worker).map(|slot| *slot.lock())
    }

    /// Summary produced by `finish`, if it has run.
    pub fn summary(&self) -> Option<BenchSummary> {
        self.summary.lock().clone()
    }

    /// Issue one write on behalf of `worker`.
    pub fn write(&self, worker: usize) -> Result<OpOutcome, EngineError> {
        self.mark_running();
        self.engine.write(worker)
    }

    /// Issue one read on behalf of `worker`.
    pub fn read(&self, worker: usize) -> Result<OpOutcome, EngineError> {
        self.mark_running();
        self.engine.read(worker)
    }

    /// Run one compaction in the caller's thread.
    pub fn compact(&self) -> Result<(), BenchError> {
        self.mark_running();
        self.engine.compact()?;
        self.compactions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Load the dataset. Counts toward the clock unless followed by `reset`.
    pub fn fill(&self) -> Result<(), BenchError> {
        self.mark_running();
        self.engine.fill()?;
        Ok(())
    }

    /// Zero all counters and restart the clock, keeping the dataset.
    pub fn reset(&self) -> Result<(), BenchError> {
        self.mark_running();
        self.engine.reset()?;
        for slot in &self.workers {
            *slot.lock() = WorkerStats::default();
        }
        self.compactions.store(0, Ordering::Relaxed);
        *self.started_at.lock() = Instant::now();
        debug!(benchmark = %self.name, "Clock reset");
        Ok(())
    }

    /// Record the outcome of one operation issued by `worker`.
    ///
    /// An engine error is returned unchanged and aborts the benchmark.
    pub fn finish_op(
        &self,
        worker: usize,
        result: Result<OpOutcome, EngineError>,
    ) -> Result<(), BenchError> {
        let outcome = result?;
        let slot = self
            .workers
            .get(worker)
            .filter(|_| worker < self.parallelism)
            .ok_or(BenchError::WorkerOutOfRange {
                worker,
                parallelism: self.parallelism,
            })?;
        if self.is_finished() {
            return Err(BenchError::NotRecording {
                name: self.name.clone(),
                state: self.state(),
            });
        }
        self.mark_running();
        slot.lock().record(outcome);
        Ok(())
    }

    /// Print a benchmark-specific message.
    pub fn note(&self, message: &str) {
        self.reporter.note(message);
    }

    /// Close the timing window and print the summary.
    ///
    /// Rejected with `AlreadyFinished` on every call after the first; nothing
    /// is printed again.
    pub fn finish(&self) -> Result<BenchSummary, BenchError> {
        let summary = {
            let mut state = self.state.lock();
            let next = state.on_finish().ok_or_else(|| BenchError::AlreadyFinished {
                name: self.name.clone(),
            })?;
            let elapsed = self.started_at.lock().elapsed();

            let mut totals = WorkerStats::default();
            for slot in &self.workers {
                totals.merge(&slot.lock());
            }

            *state = next;
            self.finished.store(true, Ordering::Release);

            BenchSummary {
                name: self.name.clone(),
                parallelism: self.parallelism,
                ops: totals.ops,
                bytes: totals.bytes,
                misses: totals.misses,
                compactions: self.compactions.load(Ordering::Relaxed),
                elapsed,
            }
        };

        debug!(
            benchmark = %self.name,
            ops = summary.ops,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Benchmark finished"
        );
        self.reporter.benchmark_finished(&summary);
        *self.summary.lock() = Some(summary.clone());
        Ok(summary)
    }

    /// Release the engine. Consumes the handle, so it runs at most once.
    pub fn stop(self) -> Result<(), BenchError> {
        *self.state.lock() = HandleState::Stopped;
        self.engine.close()?;
        debug!(benchmark = %self.name, "Engine released");
        Ok(())
    }

    fn mark_running(&self) {
        if self.active.load(Ordering::Relaxed) {
            return;
        }
        let mut state = self.state.lock();
        *state = state.on_activity();
        self.active.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::console::CaptureReporter;
    use crate::adapters::recording::{EngineCall, RecordingEngine};
    use std::time::Duration;

    fn handle(parallelism: usize) -> (BenchHandle, Arc<RecordingEngine>, Arc<CaptureReporter>) {
        let engine = Arc::new(RecordingEngine::new(parallelism));
        let reporter = Arc::new(CaptureReporter::new());
        let handle = BenchHandle::new("writes", parallelism, engine.clone(), reporter.clone());
        (handle, engine, reporter)
    }

    #[test]
    fn test_new_handle_is_created() {
        let (handle, _, _) = handle(1);
        assert_eq!(handle.state(), HandleState::Created);
        assert!(!handle.is_finished());
        assert!(handle.summary().is_none());
    }

    #[test]
    fn test_finish_op_records_in_worker_slot() {
        let (handle, _, _) = handle(2);
        handle.finish_op(1, handle.write(1)).unwrap();
        handle.finish_op(1, handle.write(1)).unwrap();
        handle.finish_op(0, handle.read(0)).unwrap();

        assert_eq!(handle.state(), HandleState::Running);
        assert_eq!(handle.worker_stats(0).unwrap().ops, 1);
        assert_eq!(handle.worker_stats(1).unwrap().ops, 2);
    }

    #[test]
    fn test_finish_op_propagates_engine_error() {
        let (handle, _, _) = handle(1);
        let err = handle
            .finish_op(0, Err(EngineError::operation("write", "disk full")))
            .unwrap_err();
        assert!(matches!(err, BenchError::Engine(EngineError::Operation { op: "write", .. })));
        assert_eq!(handle.worker_stats(0).unwrap().ops, 0);
    }

    #[test]
    fn test_finish_op_rejects_unknown_worker() {
        let (handle, _, _) = handle(2);
        let err = handle
            .finish_op(2, Ok(OpOutcome::Written { bytes: 1 }))
            .unwrap_err();
        assert!(matches!(
            err,
            BenchError::WorkerOutOfRange {
                worker: 2,
                parallelism: 2
            }
        ));
    }

    #[test]
    fn test_finish_summarises_all_workers() {
        let (handle, _, reporter) = handle(2);
        for worker in 0..2 {
            for _ in 0..10 {
                handle.finish_op(worker, handle.write(worker)).unwrap();
            }
        }
        let summary = handle.finish().unwrap();

        assert_eq!(summary.ops, 20);
        assert_eq!(summary.parallelism, 2);
        assert_eq!(handle.state(), HandleState::Finished);
        assert_eq!(reporter.summaries().len(), 1);
        assert_eq!(handle.summary(), Some(summary));
    }

    #[test]
    fn test_second_finish_rejected_without_printing() {
        let (handle, _, reporter) = handle(1);
        handle.finish().unwrap();
        let err = handle.finish().unwrap_err();

        assert!(matches!(err, BenchError::AlreadyFinished { ref name } if name == "writes"));
        assert_eq!(reporter.summaries().len(), 1);
    }

    #[test]
    fn test_finish_op_after_finish_rejected() {
        let (handle, _, _) = handle(1);
        handle.finish().unwrap();
        let err = handle
            .finish_op(0, Ok(OpOutcome::Missing))
            .unwrap_err();
        assert!(matches!(err, BenchError::NotRecording { state: HandleState::Finished, .. }));
    }

    #[test]
    fn test_reset_clears_counters() {
        let (handle, engine, _) = handle(1);
        handle.fill().unwrap();
        handle.compact().unwrap();
        handle.finish_op(0, handle.read(0)).unwrap();
        handle.reset().unwrap();

        assert_eq!(handle.worker_stats(0).unwrap(), WorkerStats::default());
        let summary = handle.finish().unwrap();
        assert_eq!(summary.ops, 0);
        assert_eq!(summary.compactions, 0);
        assert_eq!(engine.count(|c| *c == EngineCall::Reset), 1);
    }

    #[test]
    fn test_clock_starts_at_construction_without_reset() {
        let engine = Arc::new(RecordingEngine::new(1).with_fill_delay(Duration::from_millis(20)));
        let before = Instant::now();
        let handle = BenchHandle::new("rbuf reads", 1, engine, Arc::new(CaptureReporter::new()));
        handle.fill().unwrap();

        assert!(handle.started_at() >= before);
        let summary = handle.finish().unwrap();
        assert!(summary.elapsed >= Duration::from_millis(20));
    }

    #[test]
    fn test_reset_moves_clock_past_fill() {
        let engine = Arc::new(RecordingEngine::new(1).with_fill_delay(Duration::from_millis(20)));
        let handle = BenchHandle::new("rbuf reads", 1, engine, Arc::new(CaptureReporter::new()));
        handle.fill().unwrap();
        let after_fill = Instant::now();
        handle.reset().unwrap();

        assert!(handle.started_at() >= after_fill);
    }

    #[test]
    fn test_stop_closes_engine_once() {
        let (handle, engine, _) = handle(1);
        handle.finish().unwrap();
        handle.stop().unwrap();
        assert_eq!(engine.count(|c| *c == EngineCall::Close), 1);
    }
}
