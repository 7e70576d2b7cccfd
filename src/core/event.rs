//! Release-event ingestion
//!
//! A run is triggered by exactly one release event, consumed once. The
//! event arrives either as a JSON payload (webhook shape) or as a bare
//! tag on the command line.

use semver::Version;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

use crate::core::error::PublishError;
use crate::validation::version::parse_release_tag;

/// Release actions that trigger a run
const ACCEPTED_ACTIONS: &[&str] = &["created", "published"];

/// Raw release payload (webhook shape)
#[derive(Debug, Clone, Deserialize)]
pub struct ReleasePayload {
    pub action: String,
    pub release: ReleaseInfo,
}

/// Release object inside the payload
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub prerelease: bool,
}

/// Validated trigger for one pipeline run
#[derive(Debug, Clone)]
pub struct ReleaseEvent {
    /// Tag exactly as it appears on the release
    pub tag: String,

    /// Version derived from the tag (leading `v` stripped)
    pub version: Version,
}

impl ReleaseEvent {
    /// Build an event from a bare tag.
    pub fn from_tag(tag: &str) -> Result<Self, PublishError> {
        let version = parse_release_tag(tag)?;
        Ok(Self {
            tag: tag.to_string(),
            version,
        })
    }

    /// Build an event from a JSON payload string.
    pub fn from_payload_str(json: &str) -> Result<Self, PublishError> {
        let payload: ReleasePayload =
            serde_json::from_str(json).map_err(|e| PublishError::EventRejected {
                reason: format!("malformed payload: {}", e),
            })?;

        if !ACCEPTED_ACTIONS.contains(&payload.action.as_str()) {
            return Err(PublishError::EventRejected {
                reason: format!("unhandled release action '{}'", payload.action),
            });
        }

        Self::from_tag(&payload.release.tag_name)
    }

    /// Build an event from a JSON payload file.
    pub async fn from_payload_file<P: AsRef<Path>>(path: P) -> Result<Self, PublishError> {
        let content =
            fs::read_to_string(path.as_ref())
                .await
                .map_err(|e| PublishError::EventRejected {
                    reason: format!("cannot read payload file: {}", e),
                })?;
        Self::from_payload_str(&content)
    }
}
