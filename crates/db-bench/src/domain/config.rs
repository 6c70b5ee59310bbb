//! Run configuration and validation
//!
//! One `RunConfig` is built at startup and handed to the dispatcher. It is
//! never mutated afterwards, so independent runs (for example in tests) can
//! use distinct configurations side by side.
//!
//! # Example
//!
//! ```
//! use db_bench::RunConfig;
//!
//! let config = RunConfig::default()
//!     .with_filter("reads")
//!     .expect("valid regex")
//!     .with_parallelism(4);
//! assert!(config.matches("table reads (par=4)"));
//! assert!(!config.matches("writes"));
//! ```

use std::path::PathBuf;

use regex::Regex;

use crate::domain::errors::ConfigError;

/// Pattern used when no filter is given.
pub const MATCH_ALL: &str = ".*";

/// Benchmark run configuration
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Directory handed to the engine for its data
    pub storage_dir: PathBuf,
    /// Number of keys the engine loads on `fill`
    pub storage_size: usize,
    /// Benchmarks whose name does not match are skipped
    pub filter: Regex,
    /// Print matching names instead of running them
    pub list_only: bool,
    /// Thousands of operations per worker
    pub kiters: usize,
    /// Worker count for the parallel variants
    pub parallelism: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("bench.dir"),
            storage_size: 10_000,
            filter: Regex::new(MATCH_ALL).expect("match-all pattern is valid"),
            list_only: false,
            kiters: 1000,
            parallelism: 2,
        }
    }
}

impl RunConfig {
    /// Set the benchmark filter. An empty pattern matches every benchmark.
    pub fn with_filter(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.filter = compile_filter(pattern)?;
        Ok(self)
    }

    /// Builder-style method to toggle list-only mode
    pub fn with_list_only(mut self, list_only: bool) -> Self {
        self.list_only = list_only;
        self
    }

    /// Builder-style method to set the iteration multiplier
    pub fn with_kiters(mut self, kiters: usize) -> Self {
        self.kiters = kiters;
        self
    }

    /// Builder-style method to set parallelism
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Builder-style method to set the storage directory
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Builder-style method to set the dataset size
    pub fn with_storage_size(mut self, size: usize) -> Self {
        self.storage_size = size;
        self
    }

    /// Reject configurations no benchmark could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallelism == 0 {
            return Err(ConfigError::InvalidParallelism(self.parallelism));
        }
        if self.storage_size == 0 {
            return Err(ConfigError::InvalidSize(self.storage_size));
        }
        Ok(())
    }

    /// Whether a benchmark with this name passes the filter.
    pub fn matches(&self, name: &str) -> bool {
        self.filter.is_match(name)
    }

    /// Operations each worker performs in a timed loop.
    pub fn ops_per_worker(&self) -> usize {
        self.kiters.saturating_mul(1000)
    }
}

/// Compile a filter pattern, treating the empty string as match-all.
pub fn compile_filter(pattern: &str) -> Result<Regex, ConfigError> {
    let pattern = if pattern.is_empty() { MATCH_ALL } else { pattern };
    Regex::new(pattern).map_err(|source| ConfigError::InvalidFilter {
        pattern: pattern.to_string(),
        source,
    })
}
