//! Packaging metadata resolution
//!
//! Reads `[project]` from pyproject.toml when available. A setup.py-only
//! project is accepted, but its name and version stay unknown until the
//! build tool stamps them into the artifact filenames.

use serde::Deserialize;
use std::path::Path;
use tokio::fs;

use crate::core::error::PublishError;

/// Manifest the metadata was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Pyproject,
    SetupPy,
}

/// Resolved packaging metadata
#[derive(Debug, Clone)]
pub struct PackageMetadata {
    pub kind: ManifestKind,
    pub name: Option<String>,
    pub version: Option<String>,
}

impl PackageMetadata {
    /// Distribution name as it appears in artifact filenames: lowercase,
    /// with runs of `-`, `_` and `.` collapsed to a single underscore.
    pub fn dist_name(&self) -> Option<String> {
        self.name.as_deref().map(normalize_dist_name)
    }
}

/// Normalise a project name per the sdist/wheel filename conventions.
pub fn normalize_dist_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut last_was_separator = false;

    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !last_was_separator {
                result.push('_');
            }
            last_was_separator = true;
        } else {
            result.push(ch.to_ascii_lowercase());
            last_was_separator = false;
        }
    }

    result
}

#[derive(Debug, Deserialize)]
struct Pyproject {
    #[serde(default)]
    project: Option<ProjectTable>,
}

#[derive(Debug, Deserialize)]
struct ProjectTable {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    version: Option<String>,

    #[serde(default)]
    dynamic: Vec<String>,
}

/// Resolve packaging metadata for a project directory.
///
/// Fails when no packaging manifest exists, or when pyproject.toml is
/// present but unparsable.
pub async fn resolve(project_path: &Path) -> Result<PackageMetadata, PublishError> {
    let pyproject_path = project_path.join("pyproject.toml");
    if fs::metadata(&pyproject_path).await.is_ok() {
        let content = fs::read_to_string(&pyproject_path)
            .await
            .map_err(|e| PublishError::InvalidMetadata {
                message: format!("cannot read pyproject.toml: {}", e),
            })?;

        let pyproject: Pyproject =
            toml::from_str(&content).map_err(|e| PublishError::InvalidMetadata {
                message: format!("pyproject.toml is not valid TOML: {}", e),
            })?;

        if let Some(project) = pyproject.project {
            // A dynamic version is resolved by the build backend, not here.
            let version = if project.dynamic.iter().any(|d| d == "version") {
                None
            } else {
                project.version
            };

            return Ok(PackageMetadata {
                kind: ManifestKind::Pyproject,
                name: project.name,
                version,
            });
        }
    }

    let setup_path = project_path.join("setup.py");
    if fs::metadata(&setup_path).await.is_ok() {
        return Ok(PackageMetadata {
            kind: ManifestKind::SetupPy,
            name: None,
            version: None,
        });
    }

    Err(PublishError::InvalidMetadata {
        message: "no packaging manifest found (pyproject.toml or setup.py)".to_string(),
    })
}
