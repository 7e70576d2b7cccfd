pub mod core;
pub mod orchestration;
pub mod pipeline;
pub mod security;
pub mod validation;

pub use crate::core::config::{
    BuildConfig, IndexConfig, PublisherConfig, RuntimeConfig, ToolingConfig,
};
pub use crate::core::config_loader::{ConfigLoadOptions, ConfigLoader, CONFIG_FILENAME};
pub use crate::core::error::PublishError;
pub use crate::core::event::{ReleaseEvent, ReleaseInfo, ReleasePayload};
pub use crate::core::state_machine::{PipelineState, PipelineStateMachine, RunRecord};
pub use crate::orchestration::release_publisher::ReleasePublisher;
pub use crate::orchestration::report::{RunReport, StepRecord, StepStatus};
pub use crate::pipeline::step::{default_steps, ArtifactRecord, PipelineStep, StepContext};
pub use crate::security::{SafeCommandExecutor, SecureTokenManager};
