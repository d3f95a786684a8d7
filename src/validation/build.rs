//! Build and test invocation.
//!
//! The retry loop never enforces a timeout itself; `CommandBuildTool` applies
//! its own per-command limit from the build config.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::BuildConfig;
use crate::error::{RefactorError, Result};

/// Exit code reported when a command was killed or timed out
pub const ABNORMAL_EXIT: i32 = -1;

/// Outcome of compiling a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub success: bool,
    /// Build output, stderr first
    pub log: String,
}

/// Outcome of running a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRun {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestRun {
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined output handed to the feedback aggregator
    pub fn output(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Compiles a project and runs individual tests.
///
/// `Err` means the tool could not be invoked at all; a failing build or test
/// is a normal `Ok` result.
#[async_trait]
pub trait BuildTool: Send + Sync {
    async fn compile(&self, project_dir: &Path) -> Result<CompileReport>;

    async fn run_test(&self, test_id: &str, project_dir: &Path, method: Option<&str>) -> Result<TestRun>;
}

/// Raw result of one shell command
struct CommandOutput {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

/// Build tool driven by configurable shell commands (Maven by default)
pub struct CommandBuildTool {
    config: BuildConfig,
}

impl CommandBuildTool {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    /// Command line for one test, or one method of it
    pub fn test_command(&self, test_id: &str, method: Option<&str>) -> String {
        match method {
            Some(method) => self
                .config
                .test_method_command
                .replace("{test}", test_id)
                .replace("{method}", method),
            None => self.config.test_command.replace("{test}", test_id),
        }
    }

    async fn execute(&self, command: &str, dir: &Path) -> Result<CommandOutput> {
        log::debug!("Running `{}` in {}", command, dir.display());

        let output = tokio::time::timeout(
            self.timeout(),
            Command::new("sh")
                .args(["-c", command])
                .current_dir(dir)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match output {
            Ok(Ok(output)) => Ok(CommandOutput {
                exit_code: output.status.code().unwrap_or(ABNORMAL_EXIT),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            Ok(Err(e)) => Err(RefactorError::Build(format!("Failed to run `{}`: {}", command, e))),
            Err(_) => {
                log::warn!("`{}` timed out after {}ms", command, self.config.timeout_ms);
                Ok(CommandOutput {
                    exit_code: ABNORMAL_EXIT,
                    stdout: String::new(),
                    stderr: format!("Command timed out after {}ms", self.config.timeout_ms),
                })
            }
        }
    }
}

#[async_trait]
impl BuildTool for CommandBuildTool {
    async fn compile(&self, project_dir: &Path) -> Result<CompileReport> {
        let output = self.execute(&self.config.compile_command, project_dir).await?;
        let log = if output.stdout.trim().is_empty() {
            output.stderr
        } else {
            format!("{}\n{}", output.stderr, output.stdout)
        };
        Ok(CompileReport {
            success: output.exit_code == 0,
            log,
        })
    }

    async fn run_test(&self, test_id: &str, project_dir: &Path, method: Option<&str>) -> Result<TestRun> {
        let command = self.test_command(test_id, method);
        let output = self.execute(&command, project_dir).await?;
        Ok(TestRun {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
