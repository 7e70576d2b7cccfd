//! Build step: produce the sdist and wheel

use crate::core::error::PublishError;
use crate::core::state_machine::PipelineState;
use crate::pipeline::step::{ArtifactRecord, PipelineStep, StepContext, StepOutcome};
use crate::security::command_executor::combined_output;
use crate::validation::metadata::{self, normalize_dist_name, PackageMetadata};
use async_trait::async_trait;
use std::path::Path;
use walkdir::WalkDir;

/// Builds the source distribution and wheel.
///
/// Runs `python -m build --no-isolation` so the build uses the pinned
/// setuptools and wheel installed by the tooling step rather than an
/// isolated environment with floating versions. Afterwards verifies the
/// output directory holds at least one sdist and one wheel.
pub struct BuildStep {
    _private: (),
}

impl Default for BuildStep {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildStep {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

/// Collect distribution files (sdist and wheel) directly under `output_dir`.
fn collect_artifacts(output_dir: &Path) -> Vec<ArtifactRecord> {
    let mut artifacts = Vec::new();

    for entry in WalkDir::new(output_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".tar.gz") || name.ends_with(".whl") {
            let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            artifacts.push(ArtifactRecord {
                file_name: name,
                size_bytes,
            });
        }
    }

    artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    artifacts
}

/// Verify the artifact set covers both distribution formats and, when the
/// package name is known, that file names carry the expected name-version
/// prefix.
fn verify_artifacts(
    artifacts: &[ArtifactRecord],
    metadata: &PackageMetadata,
    version: &str,
    output_dir: &str,
) -> Result<(), PublishError> {
    let has_sdist = artifacts.iter().any(|a| a.file_name.ends_with(".tar.gz"));
    let has_wheel = artifacts.iter().any(|a| a.file_name.ends_with(".whl"));

    if !has_sdist || !has_wheel {
        let mut missing = Vec::new();
        if !has_sdist {
            missing.push("sdist (.tar.gz)");
        }
        if !has_wheel {
            missing.push("wheel (.whl)");
        }
        return Err(PublishError::MissingArtifacts {
            output_dir: output_dir.to_string(),
            detail: format!("no {} produced", missing.join(" or ")),
        });
    }

    if let Some(dist_name) = metadata.dist_name() {
        let prefix = format!("{dist_name}-{version}");
        if let Some(stray) = artifacts
            .iter()
            .find(|a| !normalize_dist_name(&a.file_name).starts_with(&normalize_dist_name(&prefix)))
        {
            return Err(PublishError::MissingArtifacts {
                output_dir: output_dir.to_string(),
                detail: format!(
                    "'{}' does not match expected prefix '{prefix}'",
                    stray.file_name
                ),
            });
        }
    }

    Ok(())
}

#[async_trait]
impl PipelineStep for BuildStep {
    fn name(&self) -> &str {
        "build"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Building
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<StepOutcome, PublishError> {
        let metadata = metadata::resolve(&ctx.project_path).await?;

        if let Some(manifest_version) = metadata.version.as_deref() {
            let tag_version = ctx.event.version.to_string();
            if manifest_version != tag_version {
                ctx.warn(format!(
                    "release tag version {tag_version} differs from manifest version {manifest_version}"
                ));
            }
        }

        let interpreter = ctx.config.runtime.interpreter.clone();
        let output_dir = ctx.config.build.output_dir.clone();

        let output = ctx.executor.execute(
            &interpreter,
            &["-m", "build", "--no-isolation", "--outdir", &output_dir],
        )?;
        if !output.status.success() {
            return Err(PublishError::BuildFailed {
                message: combined_output(&output),
            });
        }

        let artifacts = collect_artifacts(&ctx.project_path.join(&output_dir));
        let version = ctx.event.version.to_string();
        verify_artifacts(&artifacts, &metadata, &version, &output_dir)?;

        let detail = format!(
            "built {} artifacts: {}",
            artifacts.len(),
            artifacts
                .iter()
                .map(|a| a.file_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        ctx.metadata = Some(metadata);
        ctx.artifacts = artifacts;

        Ok(StepOutcome::with_detail(detail))
    }
}
