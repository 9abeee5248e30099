use crate::installer::PackageInstaller;
use crate::pipeline::context::BuildContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Materializes the environment from the manifest written by [`super::ResolvePhase`]
pub struct InstallPhase;

#[async_trait]
impl WorkflowPhase for InstallPhase {
    async fn execute(&self, context: &mut BuildContext) -> Result<()> {
        let manifest_path = context
            .manifest_path
            .clone()
            .context("Resolve phase must run before install")?;

        let installer = PackageInstaller::new(
            context.fs.clone(),
            context.runner.clone(),
            context.config.installer,
            context.config.python.clone(),
            Duration::from_secs(context.config.install_timeout_secs),
        );

        let environment = installer
            .install(&manifest_path, &context.config.env_dir)
            .await?;
        context.environment = Some(environment);
        Ok(())
    }

    fn skip_reason(&self, context: &BuildContext) -> Option<String> {
        context
            .skip_install
            .then(|| "installation disabled".to_string())
    }
}
