//! # Parallel Fan-Out
//!
//! Spawn `parallelism` workers running the same workload, then wait for all
//! of them.
//!
//! Each worker sends exactly one completion signal carrying its id and
//! result. The runner receives exactly `parallelism` signals before returning;
//! that join is the only synchronization point. Workers run on scoped threads
//! so the workload can borrow the bench handle directly.

use std::thread;

use crossbeam_channel::unbounded;
use tracing::{debug, error};

use crate::domain::errors::BenchError;

/// Run `workload(worker_id)` on `parallelism` threads and join on all of them.
///
/// Returns the first worker error after every worker has finished.
pub fn run_parallel<F>(parallelism: usize, workload: F) -> Result<(), BenchError>
where
    F: Fn(usize) -> Result<(), BenchError> + Sync,
{
    if parallelism == 0 {
        return Err(BenchError::InvalidParallelism(parallelism));
    }

    thread::scope(|scope| -> Result<(), BenchError> {
        let (done_tx, done_rx) = unbounded::<(usize, Result<(), BenchError>)>();
        let workload = &workload;

        for worker in 0..parallelism {
            let done_tx = done_tx.clone();
            thread::Builder::new()
                .name(format!("bench-worker-{}", worker))
                .spawn_scoped(scope, move || {
                    let result = workload(worker);
                    let _ = done_tx.send((worker, result));
                })
                .map_err(BenchError::Spawn)?;
        }
        // Only workers hold senders now, so a lost worker shows up as a
        // disconnect instead of a hang.
        drop(done_tx);

        let mut first_error = None;
        for received in 0..parallelism {
            let (worker, result) = done_rx.recv().map_err(|_| BenchError::WorkerLost {
                expected: parallelism,
                received,
            })?;
            debug!(worker, "Worker finished");
            if let Err(e) = result {
                error!(worker, error = %e, "Worker failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    })
}
