//! Version control side effect for accepted candidates.
//!
//! Committing is fire-and-forget: a failed git command is logged and the
//! target's result is unaffected.

use std::path::Path;
use std::process::Command;

use crate::config::GitConfig;
use crate::error::{RefactorError, Result};

/// Records an accepted artifact in version control
pub trait Committer: Send + Sync {
    fn commit(&self, repo: &Path, relative: &Path, message: &str);
}

/// Stages and commits one file with the `git` CLI, optionally pushing
#[derive(Debug, Clone, Default)]
pub struct GitCommitter {
    push: bool,
}

impl GitCommitter {
    pub fn new(push: bool) -> Self {
        Self { push }
    }

    fn git(repo: &Path, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(repo)
            .output()
            .map_err(|e| RefactorError::Vcs(format!("Failed to execute git {}: {}", args[0], e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(RefactorError::Vcs(format!(
                "git {} failed: {}{}",
                args[0],
                stderr.trim(),
                stdout.trim()
            )));
        }
        Ok(())
    }

    fn try_commit(&self, repo: &Path, relative: &Path, message: &str) -> Result<()> {
        let relative = relative.to_string_lossy();
        Self::git(repo, &["add", "--", relative.as_ref()])?;
        Self::git(repo, &["commit", "-m", message, "--", relative.as_ref()])?;
        if self.push {
            Self::git(repo, &["push"])?;
        }
        Ok(())
    }
}

impl Committer for GitCommitter {
    fn commit(&self, repo: &Path, relative: &Path, message: &str) {
        match self.try_commit(repo, relative, message) {
            Ok(()) => log::info!("Committed {} in {}", relative.display(), repo.display()),
            Err(e) => log::error!("Commit of {} failed: {}", relative.display(), e),
        }
    }
}

/// Used when git integration is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCommitter;

impl Committer for NoopCommitter {
    fn commit(&self, _repo: &Path, relative: &Path, _message: &str) {
        log::info!("Git disabled, not committing {}", relative.display());
    }
}

pub fn committer_for(config: &GitConfig) -> Box<dyn Committer> {
    if config.enabled {
        Box::new(GitCommitter::new(config.push))
    } else {
        Box::new(NoopCommitter)
    }
}

/// Expand the `{path}` placeholder of a commit message template
pub fn commit_message(template: &str, relative: &Path) -> String {
    template.replace("{path}", &relative.to_string_lossy())
}
