//! Error taxonomy for the release pipeline
//!
//! Every error is terminal for the run: nothing is caught or retried,
//! a failed run requires a manual re-trigger (typically a new release).

use thiserror::Error;

use crate::core::state_machine::PipelineState;
use crate::security::command_executor::CommandError;

/// Main error type for release publishing
#[derive(Error, Debug)]
pub enum PublishError {
    // Event errors
    #[error("release event rejected: {reason}")]
    EventRejected { reason: String },

    #[error("invalid release tag '{tag}': {message}")]
    InvalidTag { tag: String, message: String },

    // Fetch errors
    #[error("failed to fetch tagged revision '{tag}': {message}")]
    FetchFailed { tag: String, message: String },

    // Provisioning errors
    #[error("python {pinned} is required but was not available")]
    RuntimeUnavailable {
        pinned: String,
        found: Option<String>,
    },

    // Tooling errors
    #[error("tooling installation failed: {message}")]
    ToolingInstallFailed { message: String },

    // Clean errors
    #[error("failed to clean '{path}': {message}")]
    CleanFailed { path: String, message: String },

    // Build errors
    #[error("invalid packaging metadata: {message}")]
    InvalidMetadata { message: String },

    #[error("build failed: {message}")]
    BuildFailed { message: String },

    #[error("expected artifacts missing under '{output_dir}': {detail}")]
    MissingArtifacts { output_dir: String, detail: String },

    // Publish errors
    #[error("credential missing: environment variable {env_var} is not set")]
    TokenMissing { env_var: String },

    #[error("authentication rejected by the package index: {detail}")]
    AuthenticationRejected { detail: String },

    #[error("version {version} of {package} already exists on the index")]
    VersionConflict { package: String, version: String },

    #[error("network error: {message}")]
    NetworkError { message: String },

    #[error("upload failed: {message}")]
    PublishFailed { message: String },

    // Infrastructure errors
    #[error("command execution error: {0}")]
    Command(#[from] CommandError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Pipeline stage this error belongs to, when it has one.
    pub fn stage(&self) -> Option<PipelineState> {
        match self {
            Self::EventRejected { .. } | Self::InvalidTag { .. } | Self::Config(_) => {
                Some(PipelineState::Pending)
            }
            Self::FetchFailed { .. } => Some(PipelineState::Fetching),
            Self::RuntimeUnavailable { .. } => Some(PipelineState::Provisioning),
            Self::ToolingInstallFailed { .. } => Some(PipelineState::Installing),
            Self::CleanFailed { .. } => Some(PipelineState::Cleaning),
            Self::InvalidMetadata { .. }
            | Self::BuildFailed { .. }
            | Self::MissingArtifacts { .. } => Some(PipelineState::Building),
            Self::TokenMissing { .. }
            | Self::AuthenticationRejected { .. }
            | Self::VersionConflict { .. }
            | Self::NetworkError { .. }
            | Self::PublishFailed { .. } => Some(PipelineState::Publishing),
            Self::Command(_) | Self::InvalidTransition { .. } | Self::Io(_) => None,
        }
    }

    /// Stable error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::EventRejected { .. } => "EVENT_REJECTED",
            Self::InvalidTag { .. } => "INVALID_TAG",
            Self::FetchFailed { .. } => "FETCH_FAILED",
            Self::RuntimeUnavailable { .. } => "RUNTIME_UNAVAILABLE",
            Self::ToolingInstallFailed { .. } => "TOOLING_INSTALL_FAILED",
            Self::CleanFailed { .. } => "CLEAN_FAILED",
            Self::InvalidMetadata { .. } => "INVALID_METADATA",
            Self::BuildFailed { .. } => "BUILD_FAILED",
            Self::MissingArtifacts { .. } => "MISSING_ARTIFACTS",
            Self::TokenMissing { .. } => "TOKEN_MISSING",
            Self::AuthenticationRejected { .. } => "AUTHENTICATION_REJECTED",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::NetworkError { .. } => "NETWORK_ERROR",
            Self::PublishFailed { .. } => "PUBLISH_FAILED",
            Self::Command(_) => "COMMAND_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Suggested operator actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::EventRejected { .. } => vec![
                "Check the event payload: only release 'created'/'published' actions are handled",
            ],
            Self::InvalidTag { .. } => vec![
                "Use a SemVer tag such as v1.2.0",
            ],
            Self::FetchFailed { .. } => vec![
                "Check that the tag was pushed to the repository",
                "Run 'git fetch --tags' manually to inspect the failure",
            ],
            Self::RuntimeUnavailable { .. } => vec![
                "Install the pinned Python version or update runtime.python in the configuration",
            ],
            Self::ToolingInstallFailed { .. } => vec![
                "Check network access to the package index",
                "Check the pinned tooling versions exist",
            ],
            Self::CleanFailed { .. } => vec![
                "Check filesystem permissions on the build output directories",
            ],
            Self::InvalidMetadata { .. } => vec![
                "Check pyproject.toml ([project] name/version) or setup.py",
            ],
            Self::BuildFailed { .. } => vec![
                "Inspect the build output above",
                "Check the packaging metadata builds locally",
            ],
            Self::MissingArtifacts { .. } => vec![
                "Check the build step produced both an sdist and a wheel",
            ],
            Self::TokenMissing { .. } => vec![
                "Provide the package index token via the configured environment variable",
            ],
            Self::AuthenticationRejected { .. } => vec![
                "Check the token value and its expiry",
                "Check the token is scoped to this package",
            ],
            Self::VersionConflict { .. } => vec![
                "Published versions are immutable: cut a new release with a bumped version",
            ],
            Self::NetworkError { .. } => vec![
                "Check connectivity to the package index and re-trigger the release",
            ],
            Self::PublishFailed { .. } => vec![
                "Inspect the upload client output above",
            ],
            Self::Command(_) => vec![
                "Check the required tools (git, python, twine) are installed",
            ],
            Self::Config(_) => vec![
                "Check .release-publisher.yml against the documented schema",
            ],
            Self::InvalidTransition { .. } => vec![
                "Remove the stale .release-run.json and re-trigger the release",
            ],
            Self::Io(_) => vec![
                "Check filesystem permissions in the project directory",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_stage_and_code() {
        let error = PublishError::FetchFailed {
            tag: "v1.0.0".to_string(),
            message: "unknown revision".to_string(),
        };

        assert_eq!(error.stage(), Some(PipelineState::Fetching));
        assert_eq!(error.code(), "FETCH_FAILED");
        assert!(error.to_string().contains("v1.0.0"));
    }

    #[test]
    fn test_runtime_unavailable() {
        let error = PublishError::RuntimeUnavailable {
            pinned: "3.13.0".to_string(),
            found: Some("3.12.4".to_string()),
        };

        assert_eq!(error.stage(), Some(PipelineState::Provisioning));
        assert_eq!(error.code(), "RUNTIME_UNAVAILABLE");
    }

    #[test]
    fn test_publish_stage_errors() {
        let errors = [
            PublishError::TokenMissing {
                env_var: "PYPI_TOKEN".to_string(),
            },
            PublishError::AuthenticationRejected {
                detail: "403".to_string(),
            },
            PublishError::VersionConflict {
                package: "mypkg".to_string(),
                version: "1.2.0".to_string(),
            },
            PublishError::NetworkError {
                message: "connection refused".to_string(),
            },
        ];

        for error in errors {
            assert_eq!(error.stage(), Some(PipelineState::Publishing));
        }
    }

    #[test]
    fn test_version_conflict_display() {
        let error = PublishError::VersionConflict {
            package: "mypkg".to_string(),
            version: "1.2.0".to_string(),
        };

        let display = error.to_string();
        assert!(display.contains("mypkg"));
        assert!(display.contains("1.2.0"));
        assert!(display.contains("already exists"));
    }

    #[test]
    fn test_token_missing_names_env_var() {
        let error = PublishError::TokenMissing {
            env_var: "PYPI_TOKEN".to_string(),
        };
        assert!(error.to_string().contains("PYPI_TOKEN"));
        assert!(!error.suggested_actions().is_empty());
    }

    #[test]
    fn test_infrastructure_errors_have_no_stage() {
        let error = PublishError::InvalidTransition {
            from: PipelineState::Pending,
            to: PipelineState::Publishing,
        };
        assert_eq!(error.stage(), None);
        assert_eq!(error.code(), "INVALID_TRANSITION");
    }

    #[test]
    fn test_every_error_suggests_an_action() {
        let error = PublishError::BuildFailed {
            message: "metadata invalid".to_string(),
        };
        assert!(!error.suggested_actions().is_empty());
    }
}
