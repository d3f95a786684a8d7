//! Turning validation failures into one correction signal per attempt.

use std::sync::Arc;

use super::generator::strip_code_fence;
use super::prompts::{COMPILER_PROMPT, MULTI_TEST_SUMMARY_PROMPT};
use crate::domain::{TestFailure, ValidationOutcome};
use crate::llm::{LlmClient, Message, try_generate_text};

/// Separator between test reports in the combined summary request
pub const REPORT_SEPARATOR: &str = "\n---\n";

/// Lines of raw output kept per report when the model cannot be reached
const DIGEST_LINES: usize = 40;

pub struct FeedbackAggregator {
    client: Arc<dyn LlmClient>,
    compiler_tokens: u32,
    test_tokens: u32,
}

impl FeedbackAggregator {
    pub fn new(client: Arc<dyn LlmClient>, compiler_tokens: u32, test_tokens: u32) -> Self {
        Self {
            client,
            compiler_tokens,
            test_tokens,
        }
    }

    /// Summarise a failed validation with a single model call.
    ///
    /// `Passed` produces no feedback. If the call fails, a truncated digest of
    /// the raw evidence is returned instead so the next attempt still sees
    /// what went wrong.
    pub async fn summarize(&self, outcome: &ValidationOutcome, original: &str, candidate: &str) -> Option<String> {
        let (system, query, max_tokens) = match outcome {
            ValidationOutcome::Passed => return None,
            ValidationOutcome::TestFailures { failures } if failures.is_empty() => return None,
            ValidationOutcome::CompileFailure { log } => (
                COMPILER_PROMPT,
                format!(
                    "Compiler output:\n{}\n\nOriginal code:\n{}\n\nRefactored code:\n{}",
                    log, original, candidate
                ),
                self.compiler_tokens,
            ),
            ValidationOutcome::TestFailures { failures } => (
                MULTI_TEST_SUMMARY_PROMPT,
                format!(
                    "Test failure reports:\n{}\n\nOriginal code:\n{}\n\nRefactored code:\n{}\n\nRespond in JSON as described.",
                    join_reports(failures),
                    original,
                    candidate
                ),
                self.test_tokens,
            ),
        };

        match try_generate_text(self.client.as_ref(), Some(system), vec![Message::user(query)], max_tokens).await {
            Ok(summary) => Some(strip_code_fence(&summary)),
            Err(e) => {
                log::warn!("Feedback summary failed, using raw digest: {}", e);
                Some(digest(outcome))
            }
        }
    }
}

/// Raw test outputs in discovery order, one report per failing test
pub fn join_reports(failures: &[TestFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}]\n{}", f.test_id, f.output.trim_end()))
        .collect::<Vec<_>>()
        .join(REPORT_SEPARATOR)
}

/// Deterministic summary of the raw evidence, used when the model is unavailable
pub fn digest(outcome: &ValidationOutcome) -> String {
    match outcome {
        ValidationOutcome::Passed => String::new(),
        ValidationOutcome::CompileFailure { log } => {
            format!("Compilation failed:\n{}", truncate_lines(log, DIGEST_LINES))
        }
        ValidationOutcome::TestFailures { failures } => {
            let mut output = format!("{} test(s) failed:\n", failures.len());
            for failure in failures {
                output.push_str(&format!(
                    "- {}:\n{}\n",
                    failure.test_id,
                    truncate_lines(&failure.output, DIGEST_LINES)
                ));
            }
            output
        }
    }
}

/// Truncate text to a maximum number of lines.
fn truncate_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().take(max_lines).collect();
    let truncated = lines.len() < text.lines().count();
    let mut result = lines.join("\n");
    if truncated {
        result.push_str("\n... (truncated)");
    }
    result
}
