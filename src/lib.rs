//! refagent - iterative LLM refactoring of god classes
//!
//! Each selected class goes through a bounded retry loop: the model proposes a
//! rewrite, the build and the relevant tests validate it, failures are folded
//! back as feedback, and a passing rewrite is committed only when the model
//! judges it an improvement.

pub mod agents;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod runner;
pub mod scope;
pub mod select;
pub mod source;
pub mod storage;
pub mod validation;
pub mod vcs;
pub mod workspace;

pub use error::{RefactorError, Result};
