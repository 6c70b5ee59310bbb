//! # Domain Layer
//!
//! Pure types for the benchmark harness. No threads, no I/O.
//!
//! ## Modules
//!
//! - `config` - Run configuration and filter compilation
//! - `errors` - Engine, configuration and harness errors
//! - `lifecycle` - Bench handle state machine
//! - `stats` - Operation outcomes, per-worker counters, summaries

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod stats;
