//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while a pipeline runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Pipeline started
    Started { project_dir: String },

    PhaseStarted { phase: String },

    PhaseComplete { phase: String, duration: Duration },

    /// Phase was not run, e.g. installation in plan-only builds
    PhaseSkipped { phase: String, reason: String },

    ValidationComplete { rules: usize },

    /// Pipeline completed successfully
    Completed { total_time: Duration },

    /// Pipeline failed
    Failed { error: String },
}

pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
