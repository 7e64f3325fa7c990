//! Per-stage run summaries.
//!
//! Each orchestrator owns one [`RunSummary`] for the duration of a run and
//! returns it at the end. Failures are counted here rather than propagated.

use std::fmt;

/// Pipeline stage a summary belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Detection,
}

impl Stage {
    /// Noun for the units this stage processes.
    pub fn unit(&self) -> &'static str {
        match self {
            Stage::Download => "tile groups",
            Stage::Detection => "images",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => f.write_str("download"),
            Stage::Detection => f.write_str("detection"),
        }
    }
}

/// Attempted/succeeded/failed counts for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stage: Stage,
    /// Units the stage set out to process.
    pub total: usize,
    /// Units processed so far, successful or not.
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn new(stage: Stage, total: usize) -> Self {
        Self {
            stage,
            total,
            attempted: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.attempted += 1;
        self.failed += 1;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Whether every planned unit has been attempted.
    pub fn is_complete(&self) -> bool {
        self.attempted == self.total
    }

    /// Progress as a whole percentage of attempted over total.
    ///
    /// An empty stage counts as complete.
    pub fn progress_percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.attempted * 100 / self.total
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} succeeded, {} failed, {} total",
            self.stage,
            self.stage.unit(),
            self.succeeded,
            self.failed,
            self.total
        )
    }
}
