use crate::pipeline::context::BuildContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use crate::validation::Validator;
use anyhow::{Context, Result};
use async_trait::async_trait;

pub struct ValidatePhase;

#[async_trait]
impl WorkflowPhase for ValidatePhase {
    async fn execute(&self, context: &mut BuildContext) -> Result<()> {
        let build = context
            .build
            .as_ref()
            .context("Assemble phase must run before validate")?;

        let validator = Validator::new();
        validator.validate(build)?;
        context.validated_rules = Some(validator.rule_count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::RuntimeAssembler;
    use crate::config::PipboxConfig;
    use crate::fs::MockFileSystem;
    use crate::installer::MockCommandRunner;
    use crate::resolver::{Manifest, ProjectMetadata};
    use std::path::Path;
    use std::sync::Arc;

    fn assembled_context() -> BuildContext {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("scripts/start.sh", "#!/bin/sh\n");
        let build = RuntimeAssembler::new(fs.clone(), PipboxConfig::default())
            .assemble(
                Path::new("/mock"),
                &ProjectMetadata::default(),
                &Manifest::default(),
            )
            .unwrap();

        let mut ctx = BuildContext::new(
            "/mock",
            PipboxConfig::default(),
            fs,
            Arc::new(MockCommandRunner::new()),
        );
        ctx.build = Some(build);
        ctx
    }

    #[tokio::test]
    async fn test_validate_passes() {
        let mut ctx = assembled_context();
        ValidatePhase.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.validated_rules, Some(6));
    }

    #[tokio::test]
    async fn test_validate_rejects_root() {
        let mut ctx = assembled_context();
        if let Some(build) = ctx.build.as_mut() {
            build.runtime.user.name = "root".to_string();
        }

        let err = ValidatePhase.execute(&mut ctx).await.unwrap_err();
        assert!(err.to_string().starts_with("[NonRootUser]"));
        assert!(ctx.validated_rules.is_none());
    }
}
