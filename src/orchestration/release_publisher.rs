//! Release Publisher - Main orchestrator for release-triggered publishing
//!
//! Drives the fixed step sequence for one release event:
//! - State transitions with persistence after every step
//! - Strict ordering with fail-fast abort (no retries)
//! - Run report written at the end, success or failure

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::event::ReleaseEvent;
use crate::core::state_machine::{PipelineState, PipelineStateMachine};
use crate::orchestration::report::{RunReport, StepRecord, StepStatus};
use crate::pipeline::step::{default_steps, PipelineStep, StepContext};
use crate::validation::version::is_prerelease;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Main release pipeline orchestrator
pub struct ReleasePublisher {
    project_path: PathBuf,
    steps: Vec<Box<dyn PipelineStep>>,
}

impl ReleasePublisher {
    /// Create a publisher with the standard step sequence.
    pub fn new<P: AsRef<Path>>(project_path: P) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            steps: default_steps(),
        }
    }

    /// Create a publisher with a custom step sequence.
    ///
    /// Used by tests to drive the orchestrator with stub steps.
    pub fn with_steps<P: AsRef<Path>>(project_path: P, steps: Vec<Box<dyn PipelineStep>>) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            steps,
        }
    }

    /// Run the full pipeline for one release event.
    ///
    /// The first step failure aborts the run: the state machine lands in
    /// `Failed`, remaining steps are recorded as skipped, and the report
    /// still gets written. The returned report carries the outcome;
    /// infrastructure failures (report not writable) surface as `Err`.
    pub async fn run(
        &self,
        event: ReleaseEvent,
        config: PublisherConfig,
    ) -> anyhow::Result<RunReport> {
        let tag = event.tag.clone();
        let version = event.version.to_string();

        println!("🚀 Release {tag} triggered publishing pipeline\n");

        let mut report = RunReport::new(&tag, &version);
        let mut state_machine = PipelineStateMachine::new(&self.project_path);
        state_machine.set_release(&tag, &version);

        let mut ctx = StepContext::new(&self.project_path, config, event)?;
        if is_prerelease(&tag) {
            ctx.warn(format!("{tag} is a prerelease version"));
        }

        let mut failure: Option<PublishError> = None;

        for (index, step) in self.steps.iter().enumerate() {
            let result = self.run_step(step.as_ref(), &mut state_machine, &mut ctx).await;

            match result {
                Ok(record) => {
                    println!("  ✅ {}", step.name());
                    report.steps.push(record);
                }
                Err((record, error)) => {
                    println!("  ❌ {}: {error}", step.name());
                    for action in error.suggested_actions() {
                        println!("     💡 {action}");
                    }
                    report.steps.push(record);
                    for skipped in &self.steps[index + 1..] {
                        report.steps.push(StepRecord {
                            step: skipped.name().to_string(),
                            state: skipped.state(),
                            status: StepStatus::Skipped,
                            detail: None,
                            duration_ms: 0,
                        });
                    }
                    failure = Some(error);
                    break;
                }
            }
        }

        let final_state = match failure {
            None => {
                state_machine.transition(PipelineState::Succeeded).await?;
                PipelineState::Succeeded
            }
            Some(ref error) => {
                state_machine.fail(error).await?;
                PipelineState::Failed
            }
        };

        report.package = ctx.metadata.as_ref().and_then(|m| m.dist_name());
        report.artifacts = ctx.artifacts.clone();
        report.warnings = ctx.warnings.clone();
        report.finish(final_state, failure.as_ref());
        report.write(&self.project_path).await?;

        println!("\n{}", report.summary());

        Ok(report)
    }

    async fn run_step(
        &self,
        step: &dyn PipelineStep,
        state_machine: &mut PipelineStateMachine,
        ctx: &mut StepContext,
    ) -> Result<StepRecord, (StepRecord, PublishError)> {
        let started = Instant::now();

        let failed_record = |detail: Option<String>, started: Instant| StepRecord {
            step: step.name().to_string(),
            state: step.state(),
            status: StepStatus::Failed,
            detail,
            duration_ms: started.elapsed().as_millis() as i64,
        };

        if let Err(error) = state_machine.transition(step.state()).await {
            return Err((failed_record(None, started), error));
        }

        match step.run(ctx).await {
            Ok(outcome) => Ok(StepRecord {
                step: step.name().to_string(),
                state: step.state(),
                status: StepStatus::Succeeded,
                detail: outcome.detail,
                duration_ms: started.elapsed().as_millis() as i64,
            }),
            Err(error) => Err((failed_record(None, started), error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::step::StepOutcome;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct RecordingStep {
        name: &'static str,
        state: PipelineState,
        order: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait]
    impl PipelineStep for RecordingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn state(&self) -> PipelineState {
            self.state
        }

        async fn run(&self, _ctx: &mut StepContext) -> Result<StepOutcome, PublishError> {
            self.order.lock().unwrap().push(self.name);
            if self.fail {
                Err(PublishError::BuildFailed {
                    message: "stub failure".to_string(),
                })
            } else {
                Ok(StepOutcome::default())
            }
        }
    }

    struct CountingStep {
        state: PipelineState,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            "counting"
        }

        fn state(&self) -> PipelineState {
            self.state
        }

        async fn run(&self, _ctx: &mut StepContext) -> Result<StepOutcome, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PublishError::NetworkError {
                message: "stub network failure".to_string(),
            })
        }
    }

    fn stub_steps(
        order: &Arc<Mutex<Vec<&'static str>>>,
        fail_at: Option<&'static str>,
    ) -> Vec<Box<dyn PipelineStep>> {
        let specs: Vec<(&'static str, PipelineState)> = vec![
            ("fetch", PipelineState::Fetching),
            ("provision", PipelineState::Provisioning),
            ("tooling", PipelineState::Installing),
            ("clean", PipelineState::Cleaning),
            ("build", PipelineState::Building),
            ("publish", PipelineState::Publishing),
        ];

        specs
            .into_iter()
            .map(|(name, state)| {
                Box::new(RecordingStep {
                    name,
                    state,
                    order: Arc::clone(order),
                    fail: fail_at == Some(name),
                }) as Box<dyn PipelineStep>
            })
            .collect()
    }

    fn event() -> ReleaseEvent {
        ReleaseEvent::from_tag("v1.2.0").unwrap()
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let publisher = ReleasePublisher::with_steps(temp_dir.path(), stub_steps(&order, None));

        let report = publisher
            .run(event(), PublisherConfig::default())
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.state, PipelineState::Succeeded);
        assert_eq!(
            *order.lock().unwrap(),
            vec!["fetch", "provision", "tooling", "clean", "build", "publish"]
        );
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_steps() {
        let temp_dir = TempDir::new().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let publisher =
            ReleasePublisher::with_steps(temp_dir.path(), stub_steps(&order, Some("clean")));

        let report = publisher
            .run(event(), PublisherConfig::default())
            .await
            .unwrap();

        assert!(!report.success);
        assert_eq!(report.state, PipelineState::Failed);
        assert_eq!(report.error_code.as_deref(), Some("BUILD_FAILED"));
        assert_eq!(
            *order.lock().unwrap(),
            vec!["fetch", "provision", "tooling", "clean"]
        );

        let statuses: Vec<StepStatus> = report.steps.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Succeeded,
                StepStatus::Succeeded,
                StepStatus::Succeeded,
                StepStatus::Failed,
                StepStatus::Skipped,
                StepStatus::Skipped,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_step_runs_exactly_once() {
        let temp_dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let steps: Vec<Box<dyn PipelineStep>> = vec![Box::new(CountingStep {
            state: PipelineState::Fetching,
            calls: Arc::clone(&calls),
        })];
        let publisher = ReleasePublisher::with_steps(temp_dir.path(), steps);

        let report = publisher
            .run(event(), PublisherConfig::default())
            .await
            .unwrap();

        assert!(!report.success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prerelease_tag_warns() {
        let temp_dir = TempDir::new().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let publisher = ReleasePublisher::with_steps(temp_dir.path(), stub_steps(&order, None));

        let report = publisher
            .run(
                ReleaseEvent::from_tag("v1.0.0-rc.1").unwrap(),
                PublisherConfig::default(),
            )
            .await
            .unwrap();

        assert!(report.success);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("prerelease")));
    }

    #[tokio::test]
    async fn test_stable_tag_does_not_warn() {
        let temp_dir = TempDir::new().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let publisher = ReleasePublisher::with_steps(temp_dir.path(), stub_steps(&order, None));

        let report = publisher
            .run(event(), PublisherConfig::default())
            .await
            .unwrap();

        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_report_written_on_failure() {
        let temp_dir = TempDir::new().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let publisher =
            ReleasePublisher::with_steps(temp_dir.path(), stub_steps(&order, Some("fetch")));

        publisher
            .run(event(), PublisherConfig::default())
            .await
            .unwrap();

        assert!(temp_dir.path().join("release-report.json").exists());
        assert!(temp_dir.path().join(".release-run.json").exists());
    }

    #[tokio::test]
    async fn test_run_record_reflects_terminal_state() {
        let temp_dir = TempDir::new().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let publisher = ReleasePublisher::with_steps(temp_dir.path(), stub_steps(&order, None));

        publisher
            .run(event(), PublisherConfig::default())
            .await
            .unwrap();

        let content =
            std::fs::read_to_string(temp_dir.path().join(".release-run.json")).unwrap();
        assert!(content.contains("\"SUCCEEDED\""));
        assert!(content.contains("v1.2.0"));
    }
}
