//! Error types for refagent
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur while running the refactoring loop
#[derive(Debug, Error)]
pub enum RefactorError {
    /// Workspace artifact could not be read, written or restored
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// Build tool could not be invoked at all (not a compile failure)
    #[error("Build error: {0}")]
    Build(String),

    /// Dependency scope could not be computed
    #[error("Scope error: {0}")]
    Scope(String),

    /// Quality metrics could not be extracted
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Candidate selection failed
    #[error("Selection error: {0}")]
    Selection(String),

    /// Version control command failed
    #[error("VCS error: {0}")]
    Vcs(String),

    /// Result persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for refagent operations
pub type Result<T> = std::result::Result<T, RefactorError>;
