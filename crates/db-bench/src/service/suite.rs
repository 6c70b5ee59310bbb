//! # Benchmark Suite
//!
//! The fixed menu of benchmarks, dispatched in this order:
//!
//! | Name                   | Workers | Setup                     | Measured                      |
//! |------------------------|---------|---------------------------|-------------------------------|
//! | `writes`               | 1       | -                         | N writes, then one compaction |
//! | `write + compact`      | 1       | fill, reset               | N writes with daemon running  |
//! | `rbuf reads`           | 1       | fill, reset               | N reads from the rbuf         |
//! | `table reads`          | 1       | fill, compact ×2, reset   | N reads from the table        |
//! | `table reads (par=P)`  | P       | fill, compact ×2, reset   | N reads per worker            |
//! | `rbuf reads (par=P)`   | P       | fill, compact, reset      | N reads per worker            |
//! | `read par=P + compact` | P       | fill, compact, reset      | N reads per worker, daemon on |
//!
//! `N = 1000 × kiters`, `P = parallelism`.

use tracing::info;

use crate::domain::errors::BenchError;
use crate::service::daemon::CompactionDaemon;
use crate::service::dispatcher::Dispatcher;
use crate::service::fanout::run_parallel;
use crate::service::handle::BenchHandle;

pub const WRITES: &str = "writes";
pub const WRITE_COMPACT: &str = "write + compact";
pub const RBUF_READS: &str = "rbuf reads";
pub const TABLE_READS: &str = "table reads";

pub fn table_reads_par(parallelism: usize) -> String {
    format!("table reads (par={})", parallelism)
}

pub fn rbuf_reads_par(parallelism: usize) -> String {
    format!("rbuf reads (par={})", parallelism)
}

pub fn read_par_compact(parallelism: usize) -> String {
    format!("read par={} + compact", parallelism)
}

/// Every benchmark name, in dispatch order.
pub fn benchmark_names(parallelism: usize) -> Vec<String> {
    vec![
        WRITES.to_string(),
        WRITE_COMPACT.to_string(),
        RBUF_READS.to_string(),
        TABLE_READS.to_string(),
        table_reads_par(parallelism),
        rbuf_reads_par(parallelism),
        read_par_compact(parallelism),
    ]
}

/// Dispatch the whole menu. The first failing benchmark aborts the run.
pub fn run_suite(dispatcher: &Dispatcher) -> Result<(), BenchError> {
    let config = dispatcher.config();
    let ops = config.ops_per_worker();
    let par = config.parallelism;
    info!(ops_per_worker = ops, parallelism = par, "Starting benchmark suite");

    dispatcher.dispatch(WRITES, 1, |b| {
        write_ops(b, 0, ops)?;
        b.compact()
    })?;

    dispatcher.dispatch(WRITE_COMPACT, 1, |b| {
        b.fill()?;
        b.reset()?;
        let daemon = CompactionDaemon::start(b)?;
        write_ops(b, 0, ops)?;
        b.finish()?;
        report_compactions(b, daemon.stop()?);
        Ok(())
    })?;

    dispatcher.dispatch(RBUF_READS, 1, |b| {
        b.fill()?;
        b.reset()?;
        read_ops(b, 0, ops)
    })?;

    dispatcher.dispatch(TABLE_READS, 1, |b| {
        b.fill()?;
        b.compact()?;
        b.compact()?;
        b.reset()?;
        read_ops(b, 0, ops)
    })?;

    dispatcher.dispatch(&table_reads_par(par), par, |b| {
        b.fill()?;
        b.compact()?;
        b.compact()?;
        b.reset()?;
        run_parallel(par, |worker| read_ops(b, worker, ops))
    })?;

    dispatcher.dispatch(&rbuf_reads_par(par), par, |b| {
        b.fill()?;
        b.compact()?;
        b.reset()?;
        run_parallel(par, |worker| read_ops(b, worker, ops))
    })?;

    dispatcher.dispatch(&read_par_compact(par), par, |b| {
        b.fill()?;
        b.compact()?;
        b.reset()?;
        let daemon = CompactionDaemon::start(b)?;
        run_parallel(par, |worker| read_ops(b, worker, ops))?;
        b.finish()?;
        report_compactions(b, daemon.stop()?);
        Ok(())
    })?;

    Ok(())
}

fn write_ops(b: &BenchHandle, worker: usize, ops: usize) -> Result<(), BenchError> {
    for _ in 0..ops {
        b.finish_op(worker, b.write(worker))?;
    }
    Ok(())
}

fn read_ops(b: &BenchHandle, worker: usize, ops: usize) -> Result<(), BenchError> {
    for _ in 0..ops {
        b.finish_op(worker, b.read(worker))?;
    }
    Ok(())
}

fn report_compactions(b: &BenchHandle, completed: u64) {
    b.note(&format!("  finished {} compactions", completed));
}
