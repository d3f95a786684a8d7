//! Dependency scope: classes directly related to a target.
//!
//! The related set scopes the generator's context and decides which tests
//! are relevant to a candidate.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Target;
use crate::error::{RefactorError, Result};
use crate::select::discover_sources;
use crate::source;

/// Computes the identifiers directly related to a target
pub trait DependencyScope: Send + Sync {
    /// Callers and callees of the target, de-duplicated and in a stable order
    fn related_identifiers(&self, target: &Target) -> Result<Vec<String>>;
}

/// Scope built by scanning the project's sources.
///
/// Callers are classes whose source names the target as a whole word;
/// callees are project classes the target's source names. Output is sorted.
#[derive(Debug, Clone)]
pub struct SourceScanScope {
    project_dir: PathBuf,
    extension: String,
}

impl SourceScanScope {
    pub fn new(project_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            project_dir: project_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}

impl DependencyScope for SourceScanScope {
    fn related_identifiers(&self, target: &Target) -> Result<Vec<String>> {
        let files = discover_sources(&self.project_dir, &self.extension)?;

        let mut project_classes = BTreeSet::new();
        let mut related = BTreeSet::new();

        for relative in files {
            if relative == target.relative_path() {
                continue;
            }
            let path = self.project_dir.join(&relative);
            let code = fs::read_to_string(&path)
                .map_err(|e| RefactorError::Scope(format!("Failed to read {}: {}", path.display(), e)))?;
            let Some(class) = source::class_name_for(&relative, &code) else {
                continue;
            };
            if class == target.name() {
                continue;
            }
            if source::mentions_identifier(&code, target.name()) {
                related.insert(class.clone());
            }
            project_classes.insert(class);
        }

        let callees = source::referenced_types(target.original_source());
        related.extend(project_classes.intersection(&callees).cloned());

        log::debug!("{} has {} related class(es)", target.name(), related.len());
        Ok(related.into_iter().collect())
    }
}

/// Tests to run for a candidate: related test classes, minus the sentinel
pub fn relevant_tests(related: &[String], sentinel: &str) -> Vec<String> {
    related
        .iter()
        .filter(|id| id.as_str() != sentinel && source::is_test_identifier(id))
        .cloned()
        .collect()
}
