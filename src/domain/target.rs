//! Targets: the artifacts a run tries to improve.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A class picked by the selector, before its source is captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Class name, used to key results and look up dependents
    pub name: String,
    /// Path relative to the project root
    pub relative_path: PathBuf,
}

impl Candidate {
    pub fn new(name: impl Into<String>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
        }
    }
}

/// One artifact under improvement.
///
/// The source is captured once when the loop for this target starts and
/// cannot be changed afterwards; every rollback restores exactly this text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    relative_path: PathBuf,
    original_source: String,
}

impl Target {
    pub fn new(candidate: &Candidate, original_source: impl Into<String>) -> Self {
        Self {
            name: candidate.name.clone(),
            relative_path: candidate.relative_path.clone(),
            original_source: original_source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn original_source(&self) -> &str {
        &self.original_source
    }

    /// File extension of the artifact, defaulting to `txt`
    pub fn extension(&self) -> &str {
        self.relative_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("txt")
    }
}
