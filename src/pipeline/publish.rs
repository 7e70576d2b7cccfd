//! Publish step: upload the built artifacts to the package index

use crate::core::error::PublishError;
use crate::core::state_machine::PipelineState;
use crate::pipeline::step::{PipelineStep, StepContext, StepOutcome};
use crate::security::command_executor::combined_output;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::collections::HashMap;

/// Uploads the artifact set with twine.
///
/// Credentials go in as `TWINE_USERNAME` (the token sentinel) and
/// `TWINE_PASSWORD`, scoped to the single twine invocation. Before
/// uploading, a preflight query against the index metadata API rejects
/// re-publishing a version that already exists, since uploads are
/// immutable on the index side.
pub struct PublishStep {
    client: reqwest::Client,
}

impl Default for PublishStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishStep {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn preflight_version_check(&self, ctx: &mut StepContext) -> Result<(), PublishError> {
        let Some(name) = ctx.metadata.as_ref().and_then(|m| m.dist_name()) else {
            ctx.warn("package name unknown, skipping duplicate-version preflight".to_string());
            return Ok(());
        };

        let version = ctx.event.version.to_string();
        let url = version_url(&ctx.config.index.metadata_url, &name, &version);

        match self.client.get(&url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                Err(PublishError::VersionConflict {
                    package: name,
                    version,
                })
            }
            Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND => Ok(()),
            Ok(response) => {
                ctx.warn(format!(
                    "duplicate-version preflight returned {}, relying on upload rejection",
                    response.status()
                ));
                Ok(())
            }
            Err(e) => Err(PublishError::NetworkError {
                message: e.to_string(),
            }),
        }
    }
}

/// Build the metadata API URL for a specific release of a package.
pub fn version_url(metadata_url: &str, name: &str, version: &str) -> String {
    format!("{}/{name}/{version}/json", metadata_url.trim_end_matches('/'))
}

/// Package name for error reporting: resolved metadata when available,
/// otherwise recovered from the sdist filename the build step collected.
fn package_label(ctx: &StepContext) -> String {
    if let Some(name) = ctx.metadata.as_ref().and_then(|m| m.dist_name()) {
        return name;
    }

    let suffix = format!("-{}.tar.gz", ctx.event.version);
    ctx.artifacts
        .iter()
        .find_map(|a| a.file_name.strip_suffix(&suffix))
        .unwrap_or("package")
        .to_string()
}

/// Map a failed twine invocation to the most specific error we can.
///
/// The index rejects a re-upload of an existing version with a 400; that
/// arrives here when the duplicate-version preflight could not run.
pub fn classify_upload_failure(output: &str, package: &str, version: &str) -> PublishError {
    let lower = output.to_lowercase();

    if lower.contains("403") || lower.contains("invalid or non-existent authentication") {
        PublishError::AuthenticationRejected {
            detail: output.to_string(),
        }
    } else if lower.contains("400") && lower.contains("already exists") {
        PublishError::VersionConflict {
            package: package.to_string(),
            version: version.to_string(),
        }
    } else if lower.contains("connection") || lower.contains("timed out") || lower.contains("temporary failure") {
        PublishError::NetworkError {
            message: output.to_string(),
        }
    } else {
        PublishError::PublishFailed {
            message: output.to_string(),
        }
    }
}

#[async_trait]
impl PipelineStep for PublishStep {
    fn name(&self) -> &str {
        "publish"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Publishing
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<StepOutcome, PublishError> {
        if ctx.artifacts.is_empty() {
            return Err(PublishError::MissingArtifacts {
                output_dir: ctx.config.build.output_dir.clone(),
                detail: "no artifacts recorded by the build step".to_string(),
            });
        }

        let token = ctx.tokens.resolve().ok_or_else(|| PublishError::TokenMissing {
            env_var: ctx.config.index.token_env.clone(),
        })?;

        self.preflight_version_check(ctx).await?;

        let output_dir = ctx.config.build.output_dir.clone();
        let repository_url = ctx.config.index.repository_url.clone();
        let file_args: Vec<String> = ctx
            .artifacts
            .iter()
            .map(|a| format!("{output_dir}/{}", a.file_name))
            .collect();

        let mut args: Vec<&str> = vec![
            "upload",
            "--non-interactive",
            "--disable-progress-bar",
            "--repository-url",
            &repository_url,
        ];
        args.extend(file_args.iter().map(String::as_str));

        let mut env = HashMap::new();
        env.insert(
            "TWINE_USERNAME".to_string(),
            ctx.config.index.username_sentinel.clone(),
        );
        env.insert(
            "TWINE_PASSWORD".to_string(),
            token.expose_secret().to_string(),
        );

        let output = ctx.executor.execute_with_env("twine", &args, &env)?;
        let text = ctx.tokens.mask_in_string(&combined_output(&output));

        if !output.status.success() {
            let package = package_label(ctx);
            let version = ctx.event.version.to_string();
            return Err(classify_upload_failure(&text, &package, &version));
        }

        Ok(StepOutcome::with_detail(format!(
            "uploaded {} artifacts to {repository_url}",
            ctx.artifacts.len()
        )))
    }
}
