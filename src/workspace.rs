//! The isolated project mirror candidates are written into.
//!
//! The source project under `projects/` is only ever read. Every write,
//! build, test run and commit happens in the mirror.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::Target;
use crate::error::{RefactorError, Result};

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Use an existing directory as the workspace
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the mirror at `root`, copying `source_project` there first if it does not exist
    pub fn prepare(source_project: &Path, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !source_project.is_dir() {
            return Err(RefactorError::Workspace(format!(
                "Project directory not found: {}",
                source_project.display()
            )));
        }

        if root.exists() {
            log::info!("Reusing workspace {}", root.display());
        } else {
            log::info!(
                "Creating workspace {} from {}",
                root.display(),
                source_project.display()
            );
            copy_dir_recursive(source_project, &root).map_err(|e| {
                RefactorError::Workspace(format!("Failed to copy project into {}: {}", root.display(), e))
            })?;
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn read(&self, relative: &Path) -> Result<String> {
        let path = self.artifact_path(relative);
        fs::read_to_string(&path)
            .map_err(|e| RefactorError::Workspace(format!("Failed to read {}: {}", path.display(), e)))
    }

    /// Overwrite the artifact at `relative` with `content`
    pub fn write(&self, relative: &Path, content: &str) -> Result<()> {
        let path = self.artifact_path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)
            .map_err(|e| RefactorError::Workspace(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Put the target's captured source back on disk
    pub fn restore(&self, target: &Target) -> Result<()> {
        log::debug!("Restoring {}", target.relative_path().display());
        self.write(target.relative_path(), target.original_source())
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
