//! Pipeline step contract and shared step context

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::event::ReleaseEvent;
use crate::core::state_machine::PipelineState;
use crate::security::command_executor::SafeCommandExecutor;
use crate::security::token_manager::SecureTokenManager;
use crate::validation::metadata::PackageMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A distribution artifact produced by the build step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub file_name: String,
    pub size_bytes: u64,
}

/// Result of a successfully completed step
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    /// Short human-readable summary for the run report
    pub detail: Option<String>,
}

impl StepOutcome {
    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }
}

/// Mutable context threaded through the pipeline
///
/// Steps communicate forward through this struct: the build step records
/// resolved metadata and artifacts, the publish step consumes them.
pub struct StepContext {
    pub project_path: PathBuf,
    pub config: PublisherConfig,
    pub event: ReleaseEvent,
    pub metadata: Option<PackageMetadata>,
    pub artifacts: Vec<ArtifactRecord>,
    pub warnings: Vec<String>,
    pub executor: SafeCommandExecutor,
    pub tokens: SecureTokenManager,
}

impl StepContext {
    pub fn new(
        project_path: impl Into<PathBuf>,
        config: PublisherConfig,
        event: ReleaseEvent,
    ) -> Result<Self, PublishError> {
        let project_path = project_path.into();
        let executor = SafeCommandExecutor::new(&project_path)?;
        let tokens = SecureTokenManager::new(&config.index.token_env);

        Ok(Self {
            project_path,
            config,
            event,
            metadata: None,
            artifacts: Vec::new(),
            warnings: Vec::new(),
            executor,
            tokens,
        })
    }

    /// Record a non-fatal warning surfaced in the run report.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// A single stage of the publishing pipeline
///
/// Steps run strictly in sequence; the first error aborts the run with no
/// retry. Each step names the pipeline state it executes under.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Short name used in logs and the run report
    fn name(&self) -> &str;

    /// State the pipeline enters while this step runs
    fn state(&self) -> PipelineState;

    async fn run(&self, ctx: &mut StepContext) -> Result<StepOutcome, PublishError>;
}

/// The fixed step sequence for a release-triggered publish.
pub fn default_steps() -> Vec<Box<dyn PipelineStep>> {
    vec![
        Box::new(crate::pipeline::fetch::FetchStep::new()),
        Box::new(crate::pipeline::provision::ProvisionStep::new()),
        Box::new(crate::pipeline::tooling::ToolingStep::new()),
        Box::new(crate::pipeline::clean::CleanStep::new()),
        Box::new(crate::pipeline::build::BuildStep::new()),
        Box::new(crate::pipeline::publish::PublishStep::new()),
    ]
}
