//! Terminal record for one processed target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::attempt::{AcceptanceVerdict, Attempt};
use super::plan::Plan;
use super::target::Target;
use crate::metrics::ClassMetrics;

/// Outcome of the retry loop for one target.
///
/// Fields track the most recent attempt; after exhaustion they hold the last
/// known values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    pub target: String,
    pub relative_path: String,
    pub compiled: bool,
    pub tests_passed: bool,
    pub improved: bool,
    pub attempts_used: u32,
    pub before_metrics: Option<ClassMetrics>,
    pub after_metrics: Option<ClassMetrics>,
    /// Plan instructions the attempts worked from
    pub instructions: Vec<String>,
    /// SHA-256 of the source captured at loop entry
    pub source_sha256: String,
    pub finished_at: DateTime<Utc>,
}

impl TargetResult {
    pub fn new(target: &Target, plan: &Plan, before_metrics: Option<ClassMetrics>) -> Self {
        Self {
            target: target.name().to_string(),
            relative_path: target.relative_path().to_string_lossy().to_string(),
            compiled: false,
            tests_passed: false,
            improved: false,
            attempts_used: 0,
            before_metrics,
            after_metrics: None,
            instructions: plan.instructions(),
            source_sha256: sha256_hex(target.original_source()),
            finished_at: Utc::now(),
        }
    }

    /// Fold a validated attempt into the record
    pub fn record_attempt(&mut self, attempt: &Attempt) {
        self.attempts_used = attempt.index + 1;
        self.compiled = attempt.validation.compiled();
        self.tests_passed = attempt.validation.is_passed();
        self.improved = false;
    }

    /// Fold the judge's verdict and the candidate's metrics into the record
    pub fn record_verdict(&mut self, verdict: AcceptanceVerdict, after_metrics: Option<ClassMetrics>) {
        self.improved = verdict.is_improved();
        self.after_metrics = after_metrics;
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }
}

pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candidate, PlanUnit, TestFailure, ValidationOutcome};

    fn target() -> Target {
        Target::new(&Candidate::new("Foo", "src/Foo.java"), "class Foo {}")
    }

    fn plan() -> Plan {
        Plan {
            units: vec![PlanUnit::improve("run", "split it")],
            raw: String::new(),
        }
    }

    #[test]
    fn test_new_result_is_pessimistic() {
        let result = TargetResult::new(&target(), &plan(), None);
        assert!(!result.compiled);
        assert!(!result.tests_passed);
        assert!(!result.improved);
        assert_eq!(result.attempts_used, 0);
        assert_eq!(result.instructions, vec!["run: split it"]);
        assert_eq!(result.source_sha256, sha256_hex("class Foo {}"));
        assert_eq!(result.source_sha256.len(), 64);
    }

    #[test]
    fn test_record_attempt_tracks_latest() {
        let mut result = TargetResult::new(&target(), &plan(), None);

        let compile = ValidationOutcome::CompileFailure { log: String::new() };
        result.record_attempt(&Attempt::new(0, "x", compile));
        assert!(!result.compiled);
        assert_eq!(result.attempts_used, 1);

        let tests = ValidationOutcome::TestFailures {
            failures: vec![TestFailure::new("FooTest", "boom")],
        };
        result.record_attempt(&Attempt::new(1, "y", tests));
        assert!(result.compiled);
        assert!(!result.tests_passed);
        assert_eq!(result.attempts_used, 2);

        result.record_attempt(&Attempt::new(2, "z", ValidationOutcome::Passed));
        result.record_verdict(AcceptanceVerdict::Improved, Some(ClassMetrics::default()));
        assert!(result.compiled && result.tests_passed && result.improved);
        assert_eq!(result.attempts_used, 3);
        assert!(result.after_metrics.is_some());
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
