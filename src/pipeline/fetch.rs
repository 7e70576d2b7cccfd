//! Fetch step: check out the tagged revision

use crate::core::error::PublishError;
use crate::core::state_machine::PipelineState;
use crate::pipeline::step::{PipelineStep, StepContext, StepOutcome};
use crate::security::command_executor::combined_output;
use async_trait::async_trait;

/// Checks out the release tag so the build runs against the tagged tree.
///
/// `git fetch --tags` is best-effort (shallow CI checkouts may already have
/// the tag, detached workspaces may have no remote); the checkout itself is
/// authoritative and fails the run if the tag cannot be resolved.
pub struct FetchStep {
    _private: (),
}

impl Default for FetchStep {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchStep {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

#[async_trait]
impl PipelineStep for FetchStep {
    fn name(&self) -> &str {
        "fetch"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Fetching
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<StepOutcome, PublishError> {
        let tag = ctx.event.tag.clone();

        if let Ok(output) = ctx.executor.execute("git", &["fetch", "--tags", "--force"]) {
            if !output.status.success() {
                ctx.warn(format!(
                    "git fetch --tags failed, continuing with local refs: {}",
                    combined_output(&output)
                ));
            }
        }

        let output = ctx.executor.execute("git", &["checkout", &tag])?;
        if !output.status.success() {
            return Err(PublishError::FetchFailed {
                tag,
                message: combined_output(&output),
            });
        }

        Ok(StepOutcome::with_detail(format!("checked out {tag}")))
    }
}
