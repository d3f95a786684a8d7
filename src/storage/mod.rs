//! Per-target result persistence.
//!
//! Layout under the results root:
//!
//! ```text
//! <project>/<Target>/original.<ext>
//! <project>/<Target>/candidate.<ext>
//! <project>/<Target>/result.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{Target, TargetResult};
use crate::error::{RefactorError, Result};

pub const RESULT_FILE: &str = "result.json";

#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
    project: String,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            project: project.into(),
        }
    }

    pub fn target_dir(&self, target: &str) -> PathBuf {
        self.root.join(&self.project).join(target)
    }

    /// Write the three result files for a terminated target.
    ///
    /// `candidate` is the last generated source, or the original when no
    /// attempt produced one.
    pub fn save(&self, target: &Target, candidate: &str, result: &TargetResult) -> Result<PathBuf> {
        let dir = self.target_dir(target.name());
        fs::create_dir_all(&dir)
            .map_err(|e| RefactorError::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;

        let ext = target.extension();
        write_file(&dir.join(format!("original.{}", ext)), target.original_source())?;
        write_file(&dir.join(format!("candidate.{}", ext)), candidate)?;
        write_file(&dir.join(RESULT_FILE), &serde_json::to_string_pretty(result)?)?;

        log::debug!("Saved results for {} to {}", target.name(), dir.display());
        Ok(dir)
    }

    pub fn load(&self, target: &str) -> Result<Option<TargetResult>> {
        let path = self.target_dir(target).join(RESULT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| RefactorError::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| RefactorError::Storage(format!("Failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attempt, Candidate, Plan, ValidationOutcome};
    use tempfile::TempDir;

    fn target() -> Target {
        Target::new(&Candidate::new("Foo", "src/main/java/Foo.java"), "class Foo {}")
    }

    #[test]
    fn test_save_writes_layout() {
        let temp = TempDir::new().unwrap();
        let store = ResultStore::new(temp.path(), "demo");
        let target = target();
        let mut result = TargetResult::new(&target, &Plan::empty(""), None);
        result.record_attempt(&Attempt::new(0, "class Foo { }", ValidationOutcome::Passed));

        let dir = store.save(&target, "class Foo { }", &result).unwrap();

        assert_eq!(dir, temp.path().join("demo").join("Foo"));
        assert_eq!(fs::read_to_string(dir.join("original.java")).unwrap(), "class Foo {}");
        assert_eq!(fs::read_to_string(dir.join("candidate.java")).unwrap(), "class Foo { }");

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(dir.join(RESULT_FILE)).unwrap()).unwrap();
        assert_eq!(json["target"], "Foo");
        assert_eq!(json["attempts_used"], 1);
        assert_eq!(json["tests_passed"], true);
    }

    #[test]
    fn test_load_round_trip_and_missing() {
        let temp = TempDir::new().unwrap();
        let store = ResultStore::new(temp.path(), "demo");
        assert!(store.load("Foo").unwrap().is_none());

        let target = target();
        let result = TargetResult::new(&target, &Plan::empty(""), None);
        store.save(&target, target.original_source(), &result).unwrap();
        assert_eq!(store.load("Foo").unwrap(), Some(result));
    }
}
