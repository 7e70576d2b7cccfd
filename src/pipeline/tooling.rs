//! Tooling step: install the pinned build and upload tools

use crate::core::error::PublishError;
use crate::core::state_machine::PipelineState;
use crate::pipeline::step::{PipelineStep, StepContext, StepOutcome};
use crate::security::command_executor::combined_output;
use async_trait::async_trait;

/// Installs the pinned packaging toolchain with pip.
///
/// Runs `python -m pip install --upgrade name==version ...` so the tools
/// land in the same environment the build step will use.
pub struct ToolingStep {
    _private: (),
}

impl Default for ToolingStep {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolingStep {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

#[async_trait]
impl PipelineStep for ToolingStep {
    fn name(&self) -> &str {
        "tooling"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Installing
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<StepOutcome, PublishError> {
        let interpreter = ctx.config.runtime.interpreter.clone();
        let requirements = ctx.config.tooling.pinned_requirements();

        let mut args: Vec<&str> = vec!["-m", "pip", "install", "--upgrade"];
        args.extend(requirements.iter().map(String::as_str));

        let output = ctx.executor.execute(&interpreter, &args)?;
        if !output.status.success() {
            return Err(PublishError::ToolingInstallFailed {
                message: combined_output(&output),
            });
        }

        Ok(StepOutcome::with_detail(format!(
            "installed {}",
            requirements.join(", ")
        )))
    }
}
