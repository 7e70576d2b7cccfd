//! Clean step: remove stale build output

use crate::core::error::PublishError;
use crate::core::state_machine::PipelineState;
use crate::pipeline::step::{PipelineStep, StepContext, StepOutcome};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Removes previous build output so stale artifacts can never be uploaded.
///
/// Deletes the configured directories (`build`, `dist`) plus any directory
/// matching the configured suffix globs (`*.egg-info`). Missing paths are
/// not an error; the step is idempotent.
pub struct CleanStep {
    _private: (),
}

impl Default for CleanStep {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanStep {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

fn matches_suffix_glob(name: &str, glob: &str) -> bool {
    match glob.strip_prefix('*') {
        Some(suffix) => name.ends_with(suffix),
        None => name == glob,
    }
}

/// Collect the paths the clean step would remove under `project_path`.
fn removal_targets(project_path: &Path, dirs: &[String], globs: &[String]) -> Vec<PathBuf> {
    let mut targets: Vec<PathBuf> = dirs.iter().map(|d| project_path.join(d)).collect();

    for entry in WalkDir::new(project_path)
        .min_depth(1)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if globs.iter().any(|g| matches_suffix_glob(&name, g)) {
            targets.push(entry.path().to_path_buf());
        }
    }

    targets
}

#[async_trait]
impl PipelineStep for CleanStep {
    fn name(&self) -> &str {
        "clean"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Cleaning
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<StepOutcome, PublishError> {
        let targets = removal_targets(
            &ctx.project_path,
            &ctx.config.build.clean_dirs,
            &ctx.config.build.clean_globs,
        );

        let mut removed = 0usize;
        for target in targets {
            match tokio::fs::remove_dir_all(&target).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(PublishError::CleanFailed {
                        path: target.display().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(StepOutcome::with_detail(format!(
            "removed {removed} stale output director{}",
            if removed == 1 { "y" } else { "ies" }
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PublisherConfig;
    use crate::core::event::ReleaseEvent;
    use tempfile::TempDir;

    fn context(temp_dir: &TempDir) -> StepContext {
        StepContext::new(
            temp_dir.path(),
            PublisherConfig::default(),
            ReleaseEvent::from_tag("v1.0.0").unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_removes_build_dist_and_egg_info() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("build")).unwrap();
        std::fs::create_dir(temp_dir.path().join("dist")).unwrap();
        std::fs::create_dir(temp_dir.path().join("mypkg.egg-info")).unwrap();
        std::fs::write(temp_dir.path().join("dist/old.whl"), b"stale").unwrap();
        std::fs::create_dir(temp_dir.path().join("src")).unwrap();

        let mut ctx = context(&temp_dir);
        CleanStep::new().run(&mut ctx).await.unwrap();

        assert!(!temp_dir.path().join("build").exists());
        assert!(!temp_dir.path().join("dist").exists());
        assert!(!temp_dir.path().join("mypkg.egg-info").exists());
        assert!(temp_dir.path().join("src").exists());
    }

    #[tokio::test]
    async fn test_idempotent_on_clean_tree() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(&temp_dir);

        let step = CleanStep::new();
        step.run(&mut ctx).await.unwrap();
        step.run(&mut ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_nested_egg_info_removed() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("src/mypkg.egg-info")).unwrap();

        let mut ctx = context(&temp_dir);
        CleanStep::new().run(&mut ctx).await.unwrap();

        assert!(!temp_dir.path().join("src/mypkg.egg-info").exists());
        assert!(temp_dir.path().join("src").exists());
    }

    #[test]
    fn test_suffix_glob_matching() {
        assert!(matches_suffix_glob("mypkg.egg-info", "*.egg-info"));
        assert!(!matches_suffix_glob("mypkg.egg-info.bak", "*.egg-info"));
        assert!(matches_suffix_glob("dist", "dist"));
        assert!(!matches_suffix_glob("distx", "dist"));
    }
}
