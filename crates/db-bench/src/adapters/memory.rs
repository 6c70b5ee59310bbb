//! # In-Memory Engine
//!
//! A small two-tier key-value engine used as the default engine under test.
//!
//! ```text
//! write ──→ rbuf (BTreeMap, RwLock)
//!              │ compact: freeze, merge, install, trim
//!              ↓
//!           table (immutable merged map, swapped atomically)
//!
//! read ──→ rbuf, then table
//! ```
//!
//! Compactions are serialized against each other but run concurrently with
//! reads and writes. A key frozen by a compaction stays visible in the rbuf
//! until the merged table is installed, so reads never miss a key that was
//! written before the compaction began. Every write stores its own value
//! allocation, so the trim step can tell a frozen entry from one rewritten
//! while the compaction ran and keeps the latter.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::errors::EngineError;
use crate::domain::stats::OpOutcome;
use crate::ports::outbound::{Engine, EngineFactory, OpenOptions};

/// Size of every stored value.
pub const VALUE_SIZE: usize = 100;

type Value = Arc<[u8]>;
type Table = BTreeMap<u64, Value>;

/// Counters kept by the engine itself.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub writes: AtomicU64,
    pub reads: AtomicU64,
    pub read_misses: AtomicU64,
    /// Total number of compactions completed
    pub compactions: AtomicU64,
    /// Entries moved from the rbuf into the table
    pub entries_compacted: AtomicU64,
    /// Total time spent in compaction (nanoseconds)
    pub compaction_ns: AtomicU64,
}

impl EngineMetrics {
    /// Record a completed compaction
    pub fn record_compaction(&self, entries: u64, duration_ns: u64) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
        self.entries_compacted.fetch_add(entries, Ordering::Relaxed);
        self.compaction_ns.fetch_add(duration_ns, Ordering::Relaxed);
    }

    /// Get average compaction duration (ns)
    pub fn avg_compaction_ns(&self) -> u64 {
        let count = self.compactions.load(Ordering::Relaxed);
        if count == 0 {
            return 0;
        }
        self.compaction_ns.load(Ordering::Relaxed) / count
    }

    /// Zero the operation counters. Compaction history is kept.
    pub fn reset_ops(&self) {
        self.writes.store(0, Ordering::Relaxed);
        self.reads.store(0, Ordering::Relaxed);
        self.read_misses.store(0, Ordering::Relaxed);
    }
}

/// Two-tier in-memory engine.
pub struct MemoryEngine {
    options: OpenOptions,
    rbuf: RwLock<Table>,
    table: RwLock<Arc<Table>>,
    /// Serializes compactions.
    compaction: Mutex<()>,
    next_key: AtomicU64,
    /// Read-key generators, one per worker.
    rngs: Vec<Mutex<StdRng>>,
    metrics: EngineMetrics,
    closed: AtomicBool,
}

impl MemoryEngine {
    pub fn new(options: OpenOptions) -> Self {
        let rngs = (0..options.workers)
            .map(|worker| Mutex::new(StdRng::seed_from_u64(worker as u64)))
            .collect();
        Self {
            options,
            rbuf: RwLock::new(Table::new()),
            table: RwLock::new(Arc::new(Table::new())),
            compaction: Mutex::new(()),
            next_key: AtomicU64::new(0),
            rngs,
            metrics: EngineMetrics::default(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Entries currently in the rbuf.
    pub fn rbuf_len(&self) -> usize {
        self.rbuf.read().len()
    }

    /// Entries currently in the table.
    pub fn table_len(&self) -> usize {
        self.table.read().len()
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(EngineError::Closed);
        }
        Ok(())
    }

    fn rng(&self, worker: usize) -> Result<&Mutex<StdRng>, EngineError> {
        self.rngs.get(worker).ok_or(EngineError::UnknownWorker {
            worker,
            workers: self.rngs.len(),
        })
    }

    fn lookup(&self, key: u64) -> Option<Value> {
        if let Some(value) = self.rbuf.read().get(&key) {
            return Some(value.clone());
        }
        let table = self.table.read().clone();
        table.get(&key).cloned()
    }
}

impl Engine for MemoryEngine {
    fn write(&self, worker: usize) -> Result<OpOutcome, EngineError> {
        self.ensure_open()?;
        self.rng(worker)?;
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        self.rbuf.write().insert(key, fresh_value());
        self.metrics.writes.fetch_add(1, Ordering::Relaxed);
        Ok(OpOutcome::Written { bytes: VALUE_SIZE })
    }

    fn read(&self, worker: usize) -> Result<OpOutcome, EngineError> {
        self.ensure_open()?;
        let key = {
            let mut rng = self.rng(worker)?.lock();
            rng.gen_range(0..self.options.size.max(1) as u64)
        };
        self.metrics.reads.fetch_add(1, Ordering::Relaxed);
        match self.lookup(key) {
            Some(value) => Ok(OpOutcome::Found { bytes: value.len() }),
            None => {
                self.metrics.read_misses.fetch_add(1, Ordering::Relaxed);
                Ok(OpOutcome::Missing)
            }
        }
    }

    fn compact(&self) -> Result<(), EngineError> {
        self.ensure_open()?;
        let _guard = self.compaction.lock();
        let start = Instant::now();

        let frozen: Table = self.rbuf.read().clone();
        let mut merged: Table = (**self.table.read()).clone();
        merged.extend(frozen.iter().map(|(k, v)| (*k, v.clone())));
        *self.table.write() = Arc::new(merged);

        trim_frozen(&mut self.rbuf.write(), &frozen);

        self.metrics
            .record_compaction(frozen.len() as u64, start.elapsed().as_nanos() as u64);
        Ok(())
    }

    fn fill(&self) -> Result<(), EngineError> {
        self.ensure_open()?;
        let size = self.options.size as u64;
        {
            let mut rbuf = self.rbuf.write();
            for key in 0..size {
                rbuf.insert(key, fresh_value());
            }
        }
        self.next_key.fetch_max(size, Ordering::Relaxed);
        debug!(size, "Dataset loaded");
        Ok(())
    }

    fn reset(&self) -> Result<(), EngineError> {
        self.ensure_open()?;
        self.metrics.reset_ops();
        Ok(())
    }

    fn close(&self) -> Result<(), EngineError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!(
            dir = %self.options.dir.display(),
            writes = self.metrics.writes.load(Ordering::Relaxed),
            reads = self.metrics.reads.load(Ordering::Relaxed),
            compactions = self.metrics.compactions.load(Ordering::Relaxed),
            avg_compaction_ns = self.metrics.avg_compaction_ns(),
            "Engine closed"
        );
        Ok(())
    }
}

fn fresh_value() -> Value {
    Arc::from(vec![0xAB; VALUE_SIZE])
}

/// Drop rbuf entries that are still exactly the ones `frozen` captured.
/// Entries rewritten since the freeze hold a different allocation and stay.
fn trim_frozen(rbuf: &mut Table, frozen: &Table) {
    for (key, value) in frozen {
        if rbuf.get(key).is_some_and(|current| Arc::ptr_eq(current, value)) {
            rbuf.remove(key);
        }
    }
}

/// Opens a fresh `MemoryEngine` for each benchmark.
#[derive(Debug, Default)]
pub struct MemoryEngineFactory;

impl MemoryEngineFactory {
    pub fn new() -> Self {
        Self
    }
}

impl EngineFactory for MemoryEngineFactory {
    fn open(&self, options: &OpenOptions) -> Result<Arc<dyn Engine>, EngineError> {
        debug!(dir = %options.dir.display(), size = options.size, workers = options.workers, "Opening engine");
        Ok(Arc::new(MemoryEngine::new(options.clone())))
    }
}
