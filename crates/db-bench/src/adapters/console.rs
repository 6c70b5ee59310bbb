//! Console reporters
//!
//! `ConsoleReporter` writes benchmark output to stdout. Diagnostics go through
//! `tracing` on stderr, so stdout carries only names, summaries and notes.
//! `CaptureReporter` keeps the same lines in memory.

use std::io::Write;

use parking_lot::Mutex;
use tracing::warn;

use crate::domain::stats::BenchSummary;
use crate::ports::outbound::Reporter;

/// Prints to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = writeln!(out, "{}", line) {
            warn!(error = %e, "Failed to write benchmark output");
        }
    }
}

impl Reporter for ConsoleReporter {
    fn benchmark_listed(&self, name: &str) {
        self.emit(name);
    }

    fn benchmark_finished(&self, summary: &BenchSummary) {
        self.emit(&summary.to_string());
    }

    fn note(&self, message: &str) {
        self.emit(message);
    }
}

/// A line captured by `CaptureReporter`.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedLine {
    Listed(String),
    Finished(BenchSummary),
    Note(String),
}

/// Keeps every reported line in memory.
#[derive(Debug, Default)]
pub struct CaptureReporter {
    lines: Mutex<Vec<CapturedLine>>,
}

impl CaptureReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<CapturedLine> {
        self.lines.lock().clone()
    }

    /// Names reported in list-only mode.
    pub fn listed(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter_map(|line| match line {
                CapturedLine::Listed(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<BenchSummary> {
        self.lines
            .lock()
            .iter()
            .filter_map(|line| match line {
                CapturedLine::Finished(summary) => Some(summary.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notes(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter_map(|line| match line {
                CapturedLine::Note(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for CaptureReporter {
    fn benchmark_listed(&self, name: &str) {
        self.lines.lock().push(CapturedLine::Listed(name.to_string()));
    }

    fn benchmark_finished(&self, summary: &BenchSummary) {
        self.lines.lock().push(CapturedLine::Finished(summary.clone()));
    }

    fn note(&self, message: &str) {
        self.lines.lock().push(CapturedLine::Note(message.to_string()));
    }
}
