//! # Adapters
//!
//! Concrete implementations of the outbound ports.
//!
//! - `memory` - Two-tier in-memory engine (default engine under test)
//! - `recording` - Engine double that logs every call
//! - `console` - Stdout and in-memory reporters

pub mod console;
pub mod memory;
pub mod recording;

pub use console::{CaptureReporter, CapturedLine, ConsoleReporter};
pub use memory::{MemoryEngine, MemoryEngineFactory};
pub use recording::{EngineCall, RecordingEngine, RecordingFactory};
