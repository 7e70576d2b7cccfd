pub mod config;
pub mod config_loader;
pub mod error;
pub mod event;
pub mod state_machine;

pub use config::*;
pub use config_loader::{ConfigLoadOptions, ConfigLoader, CONFIG_FILENAME};
pub use error::PublishError;
pub use event::{ReleaseEvent, ReleaseInfo, ReleasePayload};
pub use state_machine::{PipelineState, PipelineStateMachine, RunRecord, StateTransition};
