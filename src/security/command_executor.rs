//! SafeCommandExecutor: whitelisted execution of the pipeline's tools
//!
//! Commands run through `std::process::Command` with arguments passed as a
//! slice, never interpolated into a shell string. Only the tools the
//! pipeline actually needs are allowed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;

/// Commands the pipeline is allowed to execute
const ALLOWED_COMMANDS: &[&str] = &["git", "python", "python3", "pip", "pip3", "twine"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist
    #[error("working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be spawned (binary missing, permissions)
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

/// Whitelisted command executor rooted at a working directory
#[derive(Debug)]
pub struct SafeCommandExecutor {
    working_dir: PathBuf,
}

impl SafeCommandExecutor {
    /// Create an executor, validating the working directory exists.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.exists() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self { working_dir })
    }

    /// Working directory commands run in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Execute a whitelisted command, capturing its output.
    pub fn execute(&self, command: &str, args: &[&str]) -> Result<Output, CommandError> {
        self.execute_with_env(command, args, &HashMap::new())
    }

    /// Execute a whitelisted command with extra environment variables.
    ///
    /// The extra environment is scoped to the single invocation; nothing is
    /// exported to the publisher's own process.
    pub fn execute_with_env(
        &self,
        command: &str,
        args: &[&str],
        env: &HashMap<String, String>,
    ) -> Result<Output, CommandError> {
        if !ALLOWED_COMMANDS.contains(&command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        let output = Command::new(command)
            .args(args)
            .envs(env)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        Ok(output)
    }
}

/// Combine stdout and stderr of a finished command into one trimmed string.
pub fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut combined = String::new();
    if !stdout.trim().is_empty() {
        combined.push_str(stdout.trim());
    }
    if !stderr.trim().is_empty() {
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(stderr.trim());
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rejected_command_rm() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let result = executor.execute("rm", &["-rf", "/"]);
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[test]
    fn test_rejected_command_sh() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let result = executor.execute("sh", &["-c", "echo injected"]);
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[test]
    fn test_invalid_working_directory() {
        let result = SafeCommandExecutor::new("/nonexistent/directory/for/tests");
        assert!(matches!(
            result,
            Err(CommandError::InvalidWorkingDirectory(_))
        ));
    }

    #[test]
    fn test_whitelist_contents() {
        for command in ["git", "python", "python3", "pip", "pip3", "twine"] {
            assert!(ALLOWED_COMMANDS.contains(&command));
        }
        assert!(!ALLOWED_COMMANDS.contains(&"bash"));
        assert!(!ALLOWED_COMMANDS.contains(&"curl"));
    }

    #[test]
    fn test_combined_output() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        let output = Output {
            status: ExitStatus::from_raw(0),
            stdout: b"uploaded\n".to_vec(),
            stderr: b"warning: slow network\n".to_vec(),
        };

        let combined = combined_output(&output);
        assert_eq!(combined, "uploaded\nwarning: slow network");
    }

    #[test]
    fn test_combined_output_empty() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        let output = Output {
            status: ExitStatus::from_raw(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        };

        assert_eq!(combined_output(&output), "");
    }
}
