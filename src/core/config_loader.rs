//! Configuration loading for release-publisher
//!
//! Priority (high to low): environment overrides, project config file
//! (`./.release-publisher.yml`), built-in defaults.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".release-publisher.yml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Environment variables (injected for testability)
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options using the real process environment.
    pub fn for_project<P: AsRef<Path>>(project_path: P) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            env: std::env::vars().collect(),
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the effective configuration for a project.
    pub async fn load(options: ConfigLoadOptions) -> Result<PublisherConfig, PublishError> {
        let mut config = match Self::load_project_config(&options.project_path).await? {
            Some(config) => config,
            None => PublisherConfig::default(),
        };

        Self::apply_env_overrides(&mut config, &options.env);
        Self::expand_env_vars(&mut config, &options.env)?;

        Ok(config)
    }

    /// Load the project configuration file, if present.
    async fn load_project_config(
        project_path: &Path,
    ) -> Result<Option<PublisherConfig>, PublishError> {
        let config_path = project_path.join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&config_path)
            .await
            .map_err(|e| PublishError::Config(format!("failed to read config file: {}", e)))?;

        let config: PublisherConfig = serde_yaml::from_str(&content)
            .map_err(|e| PublishError::Config(format!("failed to parse YAML config: {}", e)))?;

        Ok(Some(config))
    }

    /// Apply `RELEASE_PUBLISHER_*` environment overrides.
    fn apply_env_overrides(config: &mut PublisherConfig, env: &HashMap<String, String>) {
        if let Some(python) = env.get("RELEASE_PUBLISHER_PYTHON") {
            config.runtime.python = python.clone();
        }
        if let Some(interpreter) = env.get("RELEASE_PUBLISHER_INTERPRETER") {
            config.runtime.interpreter = interpreter.clone();
        }
        if let Some(output_dir) = env.get("RELEASE_PUBLISHER_OUTPUT_DIR") {
            config.build.output_dir = output_dir.clone();
        }
        if let Some(repository_url) = env.get("RELEASE_PUBLISHER_REPOSITORY_URL") {
            config.index.repository_url = repository_url.clone();
        }
        if let Some(metadata_url) = env.get("RELEASE_PUBLISHER_METADATA_URL") {
            config.index.metadata_url = metadata_url.clone();
        }
        if let Some(token_env) = env.get("RELEASE_PUBLISHER_TOKEN_ENV") {
            config.index.token_env = token_env.clone();
        }
    }

    /// Expand `${VAR}` references in string-valued settings.
    fn expand_env_vars(
        config: &mut PublisherConfig,
        env: &HashMap<String, String>,
    ) -> Result<(), PublishError> {
        config.index.repository_url = Self::expand(&config.index.repository_url, env)?;
        config.index.metadata_url = Self::expand(&config.index.metadata_url, env)?;
        config.runtime.interpreter = Self::expand(&config.runtime.interpreter, env)?;
        Ok(())
    }

    fn expand(value: &str, env: &HashMap<String, String>) -> Result<String, PublishError> {
        let pattern = Regex::new(ENV_VAR_PATTERN)
            .map_err(|e| PublishError::Config(format!("invalid env pattern: {}", e)))?;

        let mut result = value.to_string();
        for captures in pattern.captures_iter(value) {
            let reference = &captures[0];
            let name = &captures[1];
            let replacement = env.get(name).ok_or_else(|| {
                PublishError::Config(format!("environment variable {} is not set", name))
            })?;
            result = result.replace(reference, replacement);
        }

        Ok(result)
    }
}
