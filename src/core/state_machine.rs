//! Pipeline state tracking with atomic run-record persistence
//!
//! The run record is a diagnostic output of the run; nothing reads it back
//! on a later invocation (there is no resume edge).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::error::PublishError;

/// Run record file name
const RUN_RECORD_FILE: &str = ".release-run.json";

/// Pipeline state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Pending,
    Fetching,
    Provisioning,
    Installing,
    Cleaning,
    Building,
    Publishing,
    Succeeded,
    Failed,
}

impl PipelineState {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed)
    }

    /// The state that follows this one in the fixed pipeline sequence.
    pub fn next_in_sequence(&self) -> Option<PipelineState> {
        match self {
            PipelineState::Pending => Some(PipelineState::Fetching),
            PipelineState::Fetching => Some(PipelineState::Provisioning),
            PipelineState::Provisioning => Some(PipelineState::Installing),
            PipelineState::Installing => Some(PipelineState::Cleaning),
            PipelineState::Cleaning => Some(PipelineState::Building),
            PipelineState::Building => Some(PipelineState::Publishing),
            PipelineState::Publishing => Some(PipelineState::Succeeded),
            PipelineState::Succeeded | PipelineState::Failed => None,
        }
    }

    /// A transition is valid if it follows the sequence, or moves any
    /// non-terminal state to `Failed`.
    pub fn can_transition_to(&self, to: PipelineState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if to == PipelineState::Failed {
            return true;
        }
        self.next_in_sequence() == Some(to)
    }
}

/// Recorded state transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub timestamp: DateTime<Utc>,
}

/// Persisted run record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    #[serde(rename = "currentState")]
    pub current_state: PipelineState,

    /// Release tag driving this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Package version derived from the tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub transitions: Vec<StateTransition>,

    /// Last error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State machine for the fixed publishing pipeline
pub struct PipelineStateMachine {
    current_state: PipelineState,
    transitions: Vec<StateTransition>,
    record_path: PathBuf,
    tag: Option<String>,
    version: Option<String>,
    error: Option<String>,
}

impl PipelineStateMachine {
    /// Create a new state machine rooted at the project directory.
    pub fn new<P: AsRef<Path>>(project_path: P) -> Self {
        Self {
            current_state: PipelineState::Pending,
            transitions: Vec::new(),
            record_path: project_path.as_ref().join(RUN_RECORD_FILE),
            tag: None,
            version: None,
            error: None,
        }
    }

    /// Attach the release identity so it appears in the run record.
    pub fn set_release(&mut self, tag: &str, version: &str) {
        self.tag = Some(tag.to_string());
        self.version = Some(version.to_string());
    }

    /// Transition to a new state, rejecting moves outside the pipeline
    /// sequence, and persist the record.
    pub async fn transition(&mut self, to: PipelineState) -> Result<(), PublishError> {
        if !self.current_state.can_transition_to(to) {
            return Err(PublishError::InvalidTransition {
                from: self.current_state,
                to,
            });
        }

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
        });
        self.current_state = to;

        self.save().await?;
        Ok(())
    }

    /// Transition to `Failed`, recording the error message.
    pub async fn fail(&mut self, error: &PublishError) -> Result<(), PublishError> {
        self.error = Some(error.to_string());
        self.transition(PipelineState::Failed).await
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.current_state
    }

    /// Last recorded error, if the run failed.
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Elapsed milliseconds between the first and last transition.
    pub fn elapsed_ms(&self) -> i64 {
        match (self.transitions.first(), self.transitions.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
            _ => 0,
        }
    }

    fn record(&self) -> RunRecord {
        RunRecord {
            current_state: self.current_state,
            tag: self.tag.clone(),
            version: self.version.clone(),
            transitions: self.transitions.clone(),
            error: self.error.clone(),
        }
    }

    /// Atomic write: temp file then rename.
    async fn save(&self) -> Result<(), PublishError> {
        let json = serde_json::to_string_pretty(&self.record())
            .map_err(|e| PublishError::Config(format!("failed to encode run record: {}", e)))?;

        let temp_path = self.record_path.with_extension("json.tmp");
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.record_path).await?;

        Ok(())
    }
}
