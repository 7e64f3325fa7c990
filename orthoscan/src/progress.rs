//! Progress reporting for pipeline runs.
//!
//! Orchestrators push [`ProgressEvent`]s into an injected
//! [`ProgressObserver`] instead of writing progress directly, so callers
//! choose whether progress is logged, captured or discarded. Closures of the
//! form `Fn(&ProgressEvent)` are observers too.

use tracing::info;

use crate::summary::Stage;

/// Units processed between periodic progress events.
pub const PROGRESS_INTERVAL: usize = 5;

/// An observable step in a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Periodic progress, emitted every [`PROGRESS_INTERVAL`] units and on
    /// the last unit.
    Progress {
        stage: Stage,
        done: usize,
        total: usize,
        percent: usize,
    },

    /// An image produced at least one detection.
    Detections {
        filename: String,
        count: usize,
        done: usize,
        total: usize,
    },
}

/// Receives progress events from an orchestrator.
pub trait ProgressObserver {
    fn on_event(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent),
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Writes progress events to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Progress {
                stage,
                done,
                total,
                percent,
            } => info!("Progress: {}/{} {} ({}%)", done, total, stage.unit(), percent),
            ProgressEvent::Detections {
                filename,
                count,
                done,
                total,
            } => info!("[{}/{}] {} - {} detection(s)", done, total, filename, count),
        }
    }
}

/// Discards all progress events.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl ProgressObserver for SilentObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Whether a periodic progress event is due after `done` of `total` units.
pub fn is_progress_due(done: usize, total: usize) -> bool {
    done > 0 && (done % PROGRESS_INTERVAL == 0 || done == total)
}
