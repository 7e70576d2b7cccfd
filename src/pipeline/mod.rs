pub mod build;
pub mod clean;
pub mod fetch;
pub mod provision;
pub mod publish;
pub mod step;
pub mod tooling;

pub use build::BuildStep;
pub use clean::CleanStep;
pub use fetch::FetchStep;
pub use provision::ProvisionStep;
pub use publish::PublishStep;
pub use step::{default_steps, ArtifactRecord, PipelineStep, StepContext, StepOutcome};
pub use tooling::ToolingStep;
