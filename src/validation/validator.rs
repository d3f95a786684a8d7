//! Candidate validation: write, compile, then run every relevant test.

use std::sync::Arc;

use super::build::BuildTool;
use crate::domain::{Target, TestFailure, ValidationOutcome};
use crate::error::Result;
use crate::scope::relevant_tests;
use crate::workspace::Workspace;

pub struct CandidateValidator {
    build: Arc<dyn BuildTool>,
    workspace: Workspace,
    sentinel: String,
}

impl CandidateValidator {
    pub fn new(build: Arc<dyn BuildTool>, workspace: Workspace, sentinel: impl Into<String>) -> Self {
        Self {
            build,
            workspace,
            sentinel: sentinel.into(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Validate one candidate for `target`.
    ///
    /// The candidate overwrites the artifact on disk before anything runs. A
    /// failed build stops here; otherwise every relevant test runs on its own
    /// and all failures are collected in discovery order.
    pub async fn validate(&self, target: &Target, related: &[String], candidate: &str) -> Result<ValidationOutcome> {
        self.workspace.write(target.relative_path(), candidate)?;

        let report = self.build.compile(self.workspace.root()).await?;
        if !report.success {
            log::info!("{}: candidate does not compile", target.name());
            return Ok(ValidationOutcome::CompileFailure { log: report.log });
        }

        let tests = relevant_tests(related, &self.sentinel);
        let mut failures = Vec::new();
        for test in &tests {
            let run = self.build.run_test(test, self.workspace.root(), None).await?;
            if run.passed() {
                log::debug!("{}: {} passed", target.name(), test);
            } else {
                log::info!("{}: {} failed with exit code {}", target.name(), test, run.exit_code);
                failures.push(TestFailure::new(test.clone(), run.output()));
            }
        }

        if failures.is_empty() {
            log::info!("{}: candidate passed {} relevant test(s)", target.name(), tests.len());
            Ok(ValidationOutcome::Passed)
        } else {
            Ok(ValidationOutcome::TestFailures { failures })
        }
    }
}
