//! db-bench: run the key-value engine benchmark suite.
//!
//! Benchmark output goes to stdout; diagnostics go to stderr through
//! `tracing` (`-v` for debug, or set `RUST_LOG`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use db_bench::{run_suite, ConsoleReporter, Dispatcher, MemoryEngineFactory, RunConfig};

/// Benchmark orchestration harness for a key-value storage engine
#[derive(Parser, Debug)]
#[command(name = "db-bench")]
#[command(about = "Run write, read and compaction benchmarks against a key-value engine")]
struct Args {
    /// Directory to store database in. Passed to the engine factory; the
    /// bundled in-memory engine keeps no files and only logs it on close.
    #[arg(long, default_value = "bench.dir")]
    dir: PathBuf,

    /// Size of database
    #[arg(long, default_value = "10000")]
    size: usize,

    /// List (matching) benchmarks without running them
    #[arg(long)]
    list: bool,

    /// Regex to filter benchmarks (empty string means run all)
    #[arg(long, default_value = "")]
    run: String,

    /// Thousands of iterations to run
    #[arg(long, default_value = "1000")]
    kiters: usize,

    /// Number of concurrent threads for concurrent benchmarks
    #[arg(long, default_value = "2")]
    par: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<RunConfig> {
        let config = RunConfig::default()
            .with_storage_dir(self.dir)
            .with_storage_size(self.size)
            .with_list_only(self.list)
            .with_kiters(self.kiters)
            .with_parallelism(self.par)
            .with_filter(&self.run)
            .context("invalid benchmark filter")?;
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "db_bench=debug" } else { "db_bench=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.into_config()?;
    info!(
        dir = %config.storage_dir.display(),
        size = config.storage_size,
        filter = %config.filter,
        kiters = config.kiters,
        parallelism = config.parallelism,
        "Configuration loaded"
    );

    let dispatcher = Dispatcher::new(
        config,
        Arc::new(MemoryEngineFactory::new()),
        Arc::new(ConsoleReporter::new()),
    );
    run_suite(&dispatcher).context("benchmark run aborted")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Args::parse_from(["db-bench"]).into_config().unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("bench.dir"));
        assert_eq!(config.storage_size, 10_000);
        assert_eq!(config.kiters, 1000);
        assert_eq!(config.parallelism, 2);
        assert!(!config.list_only);
        assert!(config.matches("writes"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Args::parse_from([
            "db-bench", "--list", "--run", "^table", "--par", "4", "--kiters", "2",
        ])
        .into_config()
        .unwrap();
        assert!(config.list_only);
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.ops_per_worker(), 2000);
        assert!(config.matches("table reads (par=4)"));
        assert!(!config.matches("rbuf reads"));
    }

    #[test]
    fn test_malformed_filter_is_fatal() {
        let err = Args::parse_from(["db-bench", "--run", "("]).into_config().unwrap_err();
        assert!(err.to_string().contains("invalid benchmark filter"));
    }

    #[test]
    fn test_zero_parallelism_is_fatal() {
        assert!(Args::parse_from(["db-bench", "--par", "0"]).into_config().is_err());
    }
}
