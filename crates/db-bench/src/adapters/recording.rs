//! Recording engine
//!
//! An `Engine` that performs no storage work and logs every call it receives,
//! in order. Used to check what a benchmark body asked of the engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::domain::errors::EngineError;
use crate::domain::stats::OpOutcome;
use crate::ports::outbound::{Engine, EngineFactory, OpenOptions};

/// Bytes reported per recorded write or read.
pub const RECORDED_VALUE_SIZE: usize = 64;

/// One call received by a `RecordingEngine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Write(usize),
    Read(usize),
    Compact,
    Fill,
    Reset,
    Close,
}

/// Engine double that records calls.
#[derive(Default)]
pub struct RecordingEngine {
    workers: usize,
    calls: Mutex<Vec<EngineCall>>,
    compactions: AtomicU64,
    fill_delay: Duration,
    compact_delay: Duration,
    /// Each compaction waits for a message here, or for the sender to drop.
    compact_gate: Option<Receiver<()>>,
    /// Compactions after this many succeed are reported as failures.
    compact_failure_after: Option<u64>,
    fail_writes: bool,
}

impl RecordingEngine {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Make `fill` take at least `delay`.
    pub fn with_fill_delay(mut self, delay: Duration) -> Self {
        self.fill_delay = delay;
        self
    }

    /// Make each compaction take at least `delay`.
    pub fn with_compact_delay(mut self, delay: Duration) -> Self {
        self.compact_delay = delay;
        self
    }

    /// Hold each compaction until `gate` yields a message or disconnects.
    pub fn with_compact_gate(mut self, gate: Receiver<()>) -> Self {
        self.compact_gate = Some(gate);
        self
    }

    /// Fail every compaction after the first `succeed` ones.
    pub fn with_compact_failure_after(mut self, succeed: u64) -> Self {
        self.compact_failure_after = Some(succeed);
        self
    }

    /// Fail every write.
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// All calls in arrival order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Number of calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    /// Compactions that ran to completion.
    pub fn compactions(&self) -> u64 {
        self.compactions.load(Ordering::SeqCst)
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }

    fn check_worker(&self, worker: usize) -> Result<(), EngineError> {
        if worker >= self.workers {
            return Err(EngineError::UnknownWorker {
                worker,
                workers: self.workers,
            });
        }
        Ok(())
    }
}

impl Engine for RecordingEngine {
    fn write(&self, worker: usize) -> Result<OpOutcome, EngineError> {
        self.check_worker(worker)?;
        self.record(EngineCall::Write(worker));
        if self.fail_writes {
            return Err(EngineError::operation("write", "injected failure"));
        }
        Ok(OpOutcome::Written {
            bytes: RECORDED_VALUE_SIZE,
        })
    }

    fn read(&self, worker: usize) -> Result<OpOutcome, EngineError> {
        self.check_worker(worker)?;
        self.record(EngineCall::Read(worker));
        Ok(OpOutcome::Found {
            bytes: RECORDED_VALUE_SIZE,
        })
    }

    fn compact(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Compact);
        if let Some(gate) = &self.compact_gate {
            let _ = gate.recv();
        }
        if !self.compact_delay.is_zero() {
            std::thread::sleep(self.compact_delay);
        }
        if let Some(limit) = self.compact_failure_after {
            if self.compactions.load(Ordering::SeqCst) >= limit {
                return Err(EngineError::operation("compact", "injected failure"));
            }
        }
        self.compactions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn fill(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Fill);
        if !self.fill_delay.is_zero() {
            std::thread::sleep(self.fill_delay);
        }
        Ok(())
    }

    fn reset(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Reset);
        Ok(())
    }

    fn close(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Close);
        Ok(())
    }
}

/// Factory that opens a fresh `RecordingEngine` per benchmark and keeps every
/// engine it handed out, keyed by open order.
#[derive(Default)]
pub struct RecordingFactory {
    opened: Mutex<Vec<(OpenOptions, Arc<RecordingEngine>)>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines opened so far, with the options they were opened with.
    pub fn opened(&self) -> Vec<(OpenOptions, Arc<RecordingEngine>)> {
        self.opened.lock().clone()
    }

    /// Most recently opened engine.
    pub fn last(&self) -> Option<Arc<RecordingEngine>> {
        self.opened.lock().last().map(|(_, engine)| engine.clone())
    }
}

impl EngineFactory for RecordingFactory {
    fn open(&self, options: &OpenOptions) -> Result<Arc<dyn Engine>, EngineError> {
        let engine = Arc::new(RecordingEngine::new(options.workers));
        self.opened.lock().push((options.clone(), engine.clone()));
        Ok(engine)
    }
}
