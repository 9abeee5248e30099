use super::context::BuildContext;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait WorkflowPhase: Send + Sync {
    async fn execute(&self, context: &mut BuildContext) -> Result<()>;

    /// Reason to skip this phase for the given context, if any
    fn skip_reason(&self, _context: &BuildContext) -> Option<String> {
        None
    }
}
