use super::context::BuildContext;
use super::phase_trait::WorkflowPhase;
use super::phases::{AssemblePhase, InstallPhase, ResolvePhase, ValidatePhase};
use crate::output::schema::ImageBuild;
use crate::progress::{ProgressEvent, ProgressHandler};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct PipelineOrchestrator {
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

impl PipelineOrchestrator {
    pub fn new(progress_handler: Option<Arc<dyn ProgressHandler>>) -> Self {
        Self { progress_handler }
    }

    pub async fn execute(&self, context: &mut BuildContext) -> Result<ImageBuild> {
        let start = Instant::now();
        info!(
            "Starting build pipeline for: {}",
            context.project_dir.display()
        );

        self.emit(ProgressEvent::Started {
            project_dir: context.project_dir.display().to_string(),
        });

        match self.run_phases(context).await {
            Ok(build) => {
                self.emit(ProgressEvent::Completed {
                    total_time: start.elapsed(),
                });
                Ok(build)
            }
            Err(e) => {
                self.emit(ProgressEvent::Failed {
                    error: format!("{:#}", e),
                });
                Err(e)
            }
        }
    }

    async fn run_phases(&self, context: &mut BuildContext) -> Result<ImageBuild> {
        let workflow_phases: Vec<(Box<dyn WorkflowPhase>, &str)> = vec![
            (Box::new(ResolvePhase), "ResolvePhase"),
            (Box::new(InstallPhase), "InstallPhase"),
            (Box::new(AssemblePhase), "AssemblePhase"),
            (Box::new(ValidatePhase), "ValidatePhase"),
        ];

        for (phase, phase_name) in workflow_phases {
            if let Some(reason) = phase.skip_reason(context) {
                info!("Phase: {} skipped ({})", phase_name, reason);
                self.emit(ProgressEvent::PhaseSkipped {
                    phase: phase_name.to_string(),
                    reason,
                });
                continue;
            }

            info!("Phase: {}", phase_name);
            self.emit(ProgressEvent::PhaseStarted {
                phase: phase_name.to_string(),
            });

            let phase_start = Instant::now();
            phase
                .execute(context)
                .await
                .with_context(|| format!("Phase {} failed", phase_name))?;

            self.emit(ProgressEvent::PhaseComplete {
                phase: phase_name.to_string(),
                duration: phase_start.elapsed(),
            });

            debug!("Phase {} complete", phase_name);
        }

        if let Some(rules) = context.validated_rules {
            self.emit(ProgressEvent::ValidationComplete { rules });
        }

        let build = context
            .build
            .clone()
            .context("Pipeline finished without an image build")?;
        info!(
            dependencies = build.metadata.dependencies,
            "Pipeline complete"
        );
        Ok(build)
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }
}
