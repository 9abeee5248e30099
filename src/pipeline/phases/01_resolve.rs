use crate::pipeline::context::BuildContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use crate::resolver::{DependencyResolver, METADATA_FILE};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Parses the project metadata and writes the manifest into the work dir
pub struct ResolvePhase;

#[async_trait]
impl WorkflowPhase for ResolvePhase {
    async fn execute(&self, context: &mut BuildContext) -> Result<()> {
        let resolver = DependencyResolver::new(context.fs.clone());
        let metadata_path = context.project_dir.join(METADATA_FILE);

        let metadata = resolver.load(&metadata_path)?;
        let manifest = DependencyResolver::manifest_for(&metadata, context.config.dev_flag());

        let target = context.manifest_target();
        manifest
            .write_to(context.fs.as_ref(), &target)
            .with_context(|| format!("Failed to write manifest {}", target.display()))?;

        info!(
            requirements = manifest.len(),
            dev = %context.config.dev_flag(),
            "Manifest written to {}",
            target.display()
        );

        context.metadata = Some(metadata);
        context.manifest = Some(manifest);
        context.manifest_path = Some(target);
        Ok(())
    }
}
