//! Target-by-target execution of the retry loop.
//!
//! - RetryLoop: plan, decide, attempt, restore, persist
//! - next_transition: the pure step function between attempts
//! - RunSummary: what a run over a project produced

mod retry_loop;

pub use retry_loop::{LoopPhase, LoopSettings, RetryLoop, RunSummary, TargetOutcome, Transition, next_transition};
