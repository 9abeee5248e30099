//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { project_dir } => {
                info!(project = %project_dir, "Starting build pipeline");
            }
            ProgressEvent::PhaseStarted { phase } => {
                debug!(phase = %phase, "Phase started");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                info!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::PhaseSkipped { phase, reason } => {
                info!(phase = %phase, reason = %reason, "Phase skipped");
            }
            ProgressEvent::ValidationComplete { rules } => {
                info!(rules, "Validation passed");
            }
            ProgressEvent::Completed { total_time } => {
                info!(total_time_ms = total_time.as_millis(), "Build pipeline complete");
            }
            ProgressEvent::Failed { error } => {
                error!(error = %error, "Build pipeline failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_logging_handler_all_events() {
        let handler = LoggingHandler;

        handler.on_progress(&ProgressEvent::Started {
            project_dir: "/app".to_string(),
        });
        handler.on_progress(&ProgressEvent::PhaseStarted {
            phase: "ResolvePhase".to_string(),
        });
        handler.on_progress(&ProgressEvent::PhaseComplete {
            phase: "ResolvePhase".to_string(),
            duration: Duration::from_millis(12),
        });
        handler.on_progress(&ProgressEvent::PhaseSkipped {
            phase: "InstallPhase".to_string(),
            reason: "skip_install".to_string(),
        });
        handler.on_progress(&ProgressEvent::ValidationComplete { rules: 6 });
        handler.on_progress(&ProgressEvent::Completed {
            total_time: Duration::from_secs(1),
        });
        handler.on_progress(&ProgressEvent::Failed {
            error: "boom".to_string(),
        });
    }
}
