//! # Ports
//!
//! - `outbound` - Engine, engine factory and reporter traits the host provides

pub mod outbound;

pub use outbound::{Engine, EngineFactory, OpenOptions, Reporter};
