//! Configuration structures for release-publisher
//!
//! All tool versions are pinned here so that two runs of the same release
//! install identical tooling.

use serde::{Deserialize, Serialize};

/// Default pinned interpreter version
const DEFAULT_PYTHON_VERSION: &str = "3.13.0";

/// Default pinned tooling versions
const DEFAULT_SETUPTOOLS_VERSION: &str = "80.9.0";
const DEFAULT_WHEEL_VERSION: &str = "0.45.1";
const DEFAULT_BUILD_VERSION: &str = "1.2.2";
const DEFAULT_TWINE_VERSION: &str = "6.1.0";

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublisherConfig {
    /// Schema version (required)
    pub version: String,

    /// Runtime provisioning settings
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Build/upload tooling pins
    #[serde(default)]
    pub tooling: ToolingConfig,

    /// Build output settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Package index settings
    #[serde(default)]
    pub index: IndexConfig,
}

/// Runtime provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    /// Interpreter command used for every python invocation
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Exact pinned interpreter version
    #[serde(default = "default_python_version")]
    pub python: String,
}

/// Tooling pins: every entry installs as `name==version`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolingConfig {
    #[serde(default = "default_setuptools_version")]
    pub setuptools: String,

    #[serde(default = "default_wheel_version")]
    pub wheel: String,

    /// PEP 517 build frontend
    #[serde(default = "default_build_version")]
    pub build: String,

    /// Upload client
    #[serde(default = "default_twine_version")]
    pub twine: String,
}

impl ToolingConfig {
    /// Pinned requirement strings in install order.
    pub fn pinned_requirements(&self) -> Vec<String> {
        vec![
            format!("setuptools=={}", self.setuptools),
            format!("wheel=={}", self.wheel),
            format!("build=={}", self.build),
            format!("twine=={}", self.twine),
        ]
    }
}

/// Build output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Directory the build tool writes distributions into
    #[serde(default = "default_output_dir", rename = "outputDir")]
    pub output_dir: String,

    /// Directories removed by the clean step
    #[serde(default = "default_clean_dirs", rename = "cleanDirs")]
    pub clean_dirs: Vec<String>,

    /// Directory-name patterns removed by the clean step (e.g. `*.egg-info`)
    #[serde(default = "default_clean_globs", rename = "cleanGlobs")]
    pub clean_globs: Vec<String>,
}

/// Package index configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Upload endpoint passed to the upload client
    #[serde(default = "default_repository_url", rename = "repositoryUrl")]
    pub repository_url: String,

    /// Metadata API base used for the duplicate-version preflight
    #[serde(default = "default_metadata_url", rename = "metadataUrl")]
    pub metadata_url: String,

    /// Username sentinel denoting token authentication
    #[serde(default = "default_username_sentinel", rename = "usernameSentinel")]
    pub username_sentinel: String,

    /// Environment variable holding the index access token
    #[serde(default = "default_token_env", rename = "tokenEnv")]
    pub token_env: String,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_python_version() -> String {
    DEFAULT_PYTHON_VERSION.to_string()
}

fn default_setuptools_version() -> String {
    DEFAULT_SETUPTOOLS_VERSION.to_string()
}

fn default_wheel_version() -> String {
    DEFAULT_WHEEL_VERSION.to_string()
}

fn default_build_version() -> String {
    DEFAULT_BUILD_VERSION.to_string()
}

fn default_twine_version() -> String {
    DEFAULT_TWINE_VERSION.to_string()
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_clean_dirs() -> Vec<String> {
    vec!["build".to_string(), "dist".to_string()]
}

fn default_clean_globs() -> Vec<String> {
    vec!["*.egg-info".to_string()]
}

fn default_repository_url() -> String {
    "https://upload.pypi.org/legacy/".to_string()
}

fn default_metadata_url() -> String {
    "https://pypi.org/pypi".to_string()
}

fn default_username_sentinel() -> String {
    "__token__".to_string()
}

fn default_token_env() -> String {
    "PYPI_TOKEN".to_string()
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            runtime: RuntimeConfig::default(),
            tooling: ToolingConfig::default(),
            build: BuildConfig::default(),
            index: IndexConfig::default(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            python: default_python_version(),
        }
    }
}

impl Default for ToolingConfig {
    fn default() -> Self {
        Self {
            setuptools: default_setuptools_version(),
            wheel: default_wheel_version(),
            build: default_build_version(),
            twine: default_twine_version(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            clean_dirs: default_clean_dirs(),
            clean_globs: default_clean_globs(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            repository_url: default_repository_url(),
            metadata_url: default_metadata_url(),
            username_sentinel: default_username_sentinel(),
            token_env: default_token_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PublisherConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.runtime.python, "3.13.0");
        assert_eq!(config.build.output_dir, "dist");
        assert_eq!(config.index.username_sentinel, "__token__");
    }

    #[test]
    fn test_pinned_requirements() {
        let tooling = ToolingConfig {
            setuptools: "80.9.0".to_string(),
            wheel: "0.45.1".to_string(),
            build: "1.2.2".to_string(),
            twine: "6.1.0".to_string(),
        };

        let requirements = tooling.pinned_requirements();
        assert_eq!(requirements.len(), 4);
        assert!(requirements.contains(&"setuptools==80.9.0".to_string()));
        assert!(requirements.contains(&"twine==6.1.0".to_string()));
        // Every requirement is pinned exactly
        assert!(requirements.iter().all(|r| r.contains("==")));
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let yaml = r#"
version: "1.0"
runtime:
  python: "3.12.1"
"#;
        let config: PublisherConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.runtime.python, "3.12.1");
        // Omitted sections fall back to defaults
        assert_eq!(config.runtime.interpreter, "python3");
        assert_eq!(config.tooling.twine, DEFAULT_TWINE_VERSION);
        assert_eq!(config.build.clean_dirs, vec!["build", "dist"]);
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = PublisherConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("outputDir: dist"));
        assert!(yaml.contains("tokenEnv: PYPI_TOKEN"));

        let parsed: PublisherConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_index_overrides() {
        let yaml = r#"
version: "1.0"
index:
  repositoryUrl: https://test.pypi.org/legacy/
  metadataUrl: https://test.pypi.org/pypi
  tokenEnv: TEST_PYPI_TOKEN
"#;
        let config: PublisherConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.index.repository_url, "https://test.pypi.org/legacy/");
        assert_eq!(config.index.token_env, "TEST_PYPI_TOKEN");
        assert_eq!(config.index.username_sentinel, "__token__");
    }
}
