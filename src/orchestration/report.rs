//! Run report: the machine-readable record of a pipeline run

use crate::core::error::PublishError;
use crate::core::state_machine::PipelineState;
use crate::pipeline::step::ArtifactRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Report file written next to the run record
pub const REPORT_FILE: &str = "release-report.json";

/// Terminal status of one step in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// One step's entry in the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step: String,
    pub state: PipelineState,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub duration_ms: i64,
}

/// Full report for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub version: String,
    pub state: PipelineState,
    pub success: bool,
    pub steps: Vec<StepRecord>,
    pub artifacts: Vec<ArtifactRecord>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl RunReport {
    pub fn new(tag: &str, version: &str) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4().to_string(),
            tag: tag.to_string(),
            package: None,
            version: version.to_string(),
            state: PipelineState::Pending,
            success: false,
            steps: Vec::new(),
            artifacts: Vec::new(),
            errors: Vec::new(),
            error_code: None,
            warnings: Vec::new(),
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }

    /// Close the report with the final state and error, if any.
    pub fn finish(&mut self, state: PipelineState, error: Option<&PublishError>) {
        self.state = state;
        self.success = state == PipelineState::Succeeded;
        if let Some(error) = error {
            self.errors.push(error.to_string());
            self.error_code = Some(error.code().to_string());
        }
        self.finished_at = Utc::now();
        self.duration_ms = (self.finished_at - self.started_at).num_milliseconds();
    }

    /// Write the report atomically next to the project.
    pub async fn write(&self, project_path: &Path) -> Result<(), PublishError> {
        let report_path = project_path.join(REPORT_FILE);
        let temp_path = report_path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PublishError::Config(format!("failed to serialize report: {e}")))?;

        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &report_path).await?;

        Ok(())
    }

    /// Console summary printed at the end of a run.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let headline = if self.success {
            format!("✅ Published {} {}", self.tag, self.version)
        } else {
            format!("❌ Release {} failed in state {:?}", self.tag, self.state)
        };
        lines.push(headline);

        for step in &self.steps {
            let marker = match step.status {
                StepStatus::Succeeded => "✅",
                StepStatus::Failed => "❌",
                StepStatus::Skipped => "⏭️ ",
            };
            let detail = step
                .detail
                .as_deref()
                .map(|d| format!(" - {d}"))
                .unwrap_or_default();
            lines.push(format!("  {marker} {}{detail}", step.step));
        }

        if !self.warnings.is_empty() {
            lines.push(format!("  ⚠️  {} warning(s)", self.warnings.len()));
        }

        lines.push(format!("  Duration: {}ms", self.duration_ms));
        lines.join("\n")
    }
}
