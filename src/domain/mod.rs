//! Domain types for refagent
//!
//! - Candidate / Target: what gets improved
//! - Plan: per-unit verdicts produced before the first attempt
//! - Attempt / ValidationOutcome / AcceptanceVerdict: one retry cycle
//! - TargetResult: the record written when a target terminates

pub mod attempt;
pub mod plan;
pub mod result;
pub mod target;

pub use attempt::{AcceptanceVerdict, Attempt, TestFailure, ValidationOutcome};
pub use plan::{Plan, PlanUnit, UnitVerdict};
pub use result::{TargetResult, sha256_hex};
pub use target::{Candidate, Target};
