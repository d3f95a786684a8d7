//! One generate, validate and feedback-or-judge cycle.

use serde::{Deserialize, Serialize};

/// A test that exited non-zero, with its captured output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    pub test_id: String,
    pub output: String,
}

impl TestFailure {
    pub fn new(test_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            output: output.into(),
        }
    }
}

/// Result of compiling and testing one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// The build failed; no tests ran
    CompileFailure { log: String },
    /// Every failing relevant test, in discovery order
    TestFailures { failures: Vec<TestFailure> },
    Passed,
}

impl ValidationOutcome {
    pub fn compiled(&self) -> bool {
        !matches!(self, ValidationOutcome::CompileFailure { .. })
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, ValidationOutcome::Passed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValidationOutcome::CompileFailure { .. } => "compile failure",
            ValidationOutcome::TestFailures { .. } => "test failures",
            ValidationOutcome::Passed => "passed",
        }
    }
}

/// Judgement on a candidate that compiled and passed its tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceVerdict {
    Improved,
    NotImproved,
}

impl AcceptanceVerdict {
    pub fn from_affirmative(affirmative: bool) -> Self {
        if affirmative {
            AcceptanceVerdict::Improved
        } else {
            AcceptanceVerdict::NotImproved
        }
    }

    pub fn is_improved(&self) -> bool {
        matches!(self, AcceptanceVerdict::Improved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Zero-based, always below the attempt budget
    pub index: u32,
    pub candidate_source: String,
    pub validation: ValidationOutcome,
    /// Correction signal produced for the next attempt, if any
    pub feedback: Option<String>,
}

impl Attempt {
    pub fn new(index: u32, candidate_source: impl Into<String>, validation: ValidationOutcome) -> Self {
        Self {
            index,
            candidate_source: candidate_source.into(),
            validation,
            feedback: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_flags() {
        let compile = ValidationOutcome::CompileFailure {
            log: "cannot find symbol".to_string(),
        };
        let tests = ValidationOutcome::TestFailures {
            failures: vec![TestFailure::new("FooTest", "expected 1")],
        };

        assert!(!compile.compiled());
        assert!(tests.compiled());
        assert!(!tests.is_passed());
        assert!(ValidationOutcome::Passed.is_passed());
        assert_eq!(compile.label(), "compile failure");
    }

    #[test]
    fn test_verdict_from_affirmative() {
        assert_eq!(AcceptanceVerdict::from_affirmative(true), AcceptanceVerdict::Improved);
        assert!(!AcceptanceVerdict::from_affirmative(false).is_improved());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(ValidationOutcome::Passed).unwrap();
        assert_eq!(json["outcome"], "passed");
    }
}
