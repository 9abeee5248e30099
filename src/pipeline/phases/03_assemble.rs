use crate::assemble::RuntimeAssembler;
use crate::pipeline::context::BuildContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;

pub struct AssemblePhase;

#[async_trait]
impl WorkflowPhase for AssemblePhase {
    async fn execute(&self, context: &mut BuildContext) -> Result<()> {
        let metadata = context
            .metadata
            .as_ref()
            .context("Resolve phase must run before assemble")?;
        let manifest = context
            .manifest
            .as_ref()
            .context("Resolve phase must run before assemble")?;

        let assembler = RuntimeAssembler::new(context.fs.clone(), context.config.clone());
        let build = assembler.assemble(&context.project_dir, metadata, manifest)?;

        context.build = Some(build);
        Ok(())
    }
}
