//! # Operation Accounting
//!
//! Per-worker counters and the summary printed when a benchmark finishes.

use std::fmt;
use std::time::Duration;

/// Outcome of a single engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    /// A value of `bytes` bytes was written.
    Written { bytes: usize },
    /// The key was present; `bytes` bytes were read.
    Found { bytes: usize },
    /// The key was not present.
    Missing,
}

impl OpOutcome {
    /// Payload bytes moved by the operation.
    pub fn bytes(&self) -> usize {
        match self {
            OpOutcome::Written { bytes } | OpOutcome::Found { bytes } => *bytes,
            OpOutcome::Missing => 0,
        }
    }
}

/// Counters owned by one worker lane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub ops: u64,
    pub bytes: u64,
    pub misses: u64,
}

impl WorkerStats {
    /// Record one completed operation.
    pub fn record(&mut self, outcome: OpOutcome) {
        self.ops += 1;
        self.bytes += outcome.bytes() as u64;
        if outcome == OpOutcome::Missing {
            self.misses += 1;
        }
    }

    /// Fold another lane's counters into this one.
    pub fn merge(&mut self, other: &WorkerStats) {
        self.ops += other.ops;
        self.bytes += other.bytes;
        self.misses += other.misses;
    }
}

/// Timing and throughput of one finished benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchSummary {
    pub name: String,
    pub parallelism: usize,
    pub ops: u64,
    pub bytes: u64,
    pub misses: u64,
    /// Compactions the body ran in the foreground (daemon runs excluded)
    pub compactions: u64,
    pub elapsed: Duration,
}

impl BenchSummary {
    /// Operations per second across all workers.
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.ops as f64 / secs
        } else {
            0.0
        }
    }

    /// Wall-clock nanoseconds per operation.
    pub fn ns_per_op(&self) -> f64 {
        if self.ops > 0 {
            self.elapsed.as_nanos() as f64 / self.ops as f64
        } else {
            0.0
        }
    }

    /// Payload throughput in MB/s.
    pub fn mb_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / (1024.0 * 1024.0) / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for BenchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:>10} ops {:>10.3}s {:>12.0} ops/s {:>10.1} ns/op {:>8.2} MB/s",
            self.name,
            self.ops,
            self.elapsed.as_secs_f64(),
            self.ops_per_sec(),
            self.ns_per_op(),
            self.mb_per_sec(),
        )?;
        if self.misses > 0 {
            write!(f, " ({} misses)", self.misses)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(ops: u64, elapsed: Duration) -> BenchSummary {
        BenchSummary {
            name: "writes".to_string(),
            parallelism: 1,
            ops,
            bytes: ops * 100,
            misses: 0,
            compactions: 0,
            elapsed,
        }
    }

    #[test]
    fn test_worker_stats_record() {
        let mut stats = WorkerStats::default();
        stats.record(OpOutcome::Written { bytes: 100 });
        stats.record(OpOutcome::Found { bytes: 50 });
        stats.record(OpOutcome::Missing);

        assert_eq!(stats.ops, 3);
        assert_eq!(stats.bytes, 150);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_worker_stats_merge() {
        let mut total = WorkerStats {
            ops: 2,
            bytes: 20,
            misses: 1,
        };
        total.merge(&WorkerStats {
            ops: 3,
            bytes: 30,
            misses: 0,
        });
        assert_eq!(
            total,
            WorkerStats {
                ops: 5,
                bytes: 50,
                misses: 1
            }
        );
    }

    #[test]
    fn test_throughput() {
        let s = summary(1000, Duration::from_millis(500));
        assert!((s.ops_per_sec() - 2000.0).abs() < 1e-6);
        assert!((s.ns_per_op() - 500_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_elapsed_and_zero_ops() {
        let s = summary(0, Duration::ZERO);
        assert_eq!(s.ops_per_sec(), 0.0);
        assert_eq!(s.ns_per_op(), 0.0);
        assert_eq!(s.mb_per_sec(), 0.0);
    }

    #[test]
    fn test_display_includes_name_and_ops() {
        let line = summary(1000, Duration::from_secs(1)).to_string();
        assert!(line.starts_with("writes"));
        assert!(line.contains("1000 ops"));
        assert!(!line.contains("misses"));
    }
}
