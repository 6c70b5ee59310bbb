//! # Compaction Daemon
//!
//! Runs compactions back to back on a dedicated thread until stopped.
//!
//! ## Stop Handshake
//!
//! The daemon owns the sending side of a zero-capacity channel. Between
//! compactions it offers its completion count with `try_send`, which succeeds
//! only if `stop` is already blocked in `recv`. Otherwise the offer fails
//! immediately and the daemon runs another compaction.
//!
//! ```text
//! daemon:  offer(n) ✗ → compact → n+1 → offer(n+1) ✗ → compact → ... → offer(k) ✓ → exit
//! caller:                                          stop() ── recv blocks ──────┘ returns k
//! ```
//!
//! `k` counts exactly the compactions that finished before the handshake. A
//! compaction in flight when `stop` is called completes and is counted; no
//! new one starts afterwards.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, TrySendError};
use tracing::{debug, error, warn};

use crate::domain::errors::{BenchError, EngineError};
use crate::ports::outbound::Engine;
use crate::service::handle::BenchHandle;

type Handoff = Result<u64, EngineError>;

/// A running compaction daemon. Stop it with [`CompactionDaemon::stop`].
pub struct CompactionDaemon {
    benchmark: String,
    handoff: Receiver<Handoff>,
    thread: Option<JoinHandle<()>>,
}

impl CompactionDaemon {
    /// Start compacting `handle`'s engine continuously.
    pub fn start(handle: &BenchHandle) -> Result<Self, BenchError> {
        Self::spawn(handle.name(), handle.engine().clone())
    }

    /// Start compacting `engine` continuously.
    pub fn spawn(benchmark: &str, engine: Arc<dyn Engine>) -> Result<Self, BenchError> {
        let (tx, rx) = bounded::<Handoff>(0);

        let thread = thread::Builder::new()
            .name("compaction".to_string())
            .spawn(move || {
                let mut completed: u64 = 0;
                loop {
                    match tx.try_send(Ok(completed)) {
                        Ok(()) => return,
                        Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Disconnected(_)) => return,
                    }
                    if let Err(e) = engine.compact() {
                        error!(error = %e, completed, "Background compaction failed");
                        // Hand the failure to whoever stops us.
                        let _ = tx.send(Err(e));
                        return;
                    }
                    completed += 1;
                }
            })
            .map_err(BenchError::Spawn)?;

        debug!(benchmark, "Compaction daemon started");
        Ok(Self {
            benchmark: benchmark.to_string(),
            handoff: rx,
            thread: Some(thread),
        })
    }

    /// Stop the daemon and return the number of compactions it completed.
    ///
    /// Blocks until the compaction in flight, if any, finishes.
    pub fn stop(mut self) -> Result<u64, BenchError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<u64, BenchError> {
        let received = self.handoff.recv();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(benchmark = %self.benchmark, "Compaction daemon panicked");
            }
        }
        let completed = received.map_err(|_| BenchError::DaemonLost)??;
        debug!(benchmark = %self.benchmark, completed, "Compaction daemon stopped");
        Ok(completed)
    }
}

impl Drop for CompactionDaemon {
    fn drop(&mut self) {
        if self.thread.is_some() {
            warn!(
                benchmark = %self.benchmark,
                "Compaction daemon dropped without stop; stopping it now"
            );
            if let Err(e) = self.shutdown() {
                error!(benchmark = %self.benchmark, error = %e, "Compaction daemon stop failed");
            }
        }
    }
}
