//! Provision step: verify the pinned interpreter is available

use crate::core::error::PublishError;
use crate::core::state_machine::PipelineState;
use crate::pipeline::step::{PipelineStep, StepContext, StepOutcome};
use crate::security::command_executor::combined_output;
use async_trait::async_trait;
use regex::Regex;

/// Verifies the configured interpreter exists and matches the pinned
/// Python version exactly.
pub struct ProvisionStep {
    _private: (),
}

impl Default for ProvisionStep {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisionStep {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

/// Extract the version number from `python --version` output.
///
/// # Examples
///
/// ```
/// use release_publisher::pipeline::provision::parse_python_version;
///
/// assert_eq!(parse_python_version("Python 3.13.0"), Some("3.13.0".to_string()));
/// assert_eq!(parse_python_version("not python"), None);
/// ```
pub fn parse_python_version(output: &str) -> Option<String> {
    let pattern = Regex::new(r"Python (\d+\.\d+\.\d+)").expect("version pattern is valid");
    pattern
        .captures(output)
        .map(|caps| caps[1].to_string())
}

#[async_trait]
impl PipelineStep for ProvisionStep {
    fn name(&self) -> &str {
        "provision"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Provisioning
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<StepOutcome, PublishError> {
        let interpreter = ctx.config.runtime.interpreter.clone();
        let pinned = ctx.config.runtime.python.clone();

        let output = ctx
            .executor
            .execute(&interpreter, &["--version"])
            .map_err(|_| PublishError::RuntimeUnavailable {
                pinned: pinned.clone(),
                found: None,
            })?;

        if !output.status.success() {
            return Err(PublishError::RuntimeUnavailable {
                pinned,
                found: None,
            });
        }

        let text = combined_output(&output);
        let found = parse_python_version(&text);

        match found {
            Some(ref version) if *version == pinned => Ok(StepOutcome::with_detail(format!(
                "{interpreter} {version}"
            ))),
            found => Err(PublishError::RuntimeUnavailable { pinned, found }),
        }
    }
}
