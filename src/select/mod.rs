//! Candidate selection: which classes a run tries to improve.

pub mod ranker;

use std::fs;
use std::path::{Path, PathBuf};

pub use ranker::{HeuristicRanker, PmdRanker, RankedClass, Ranker};

use crate::config::{DetectorTool, SelectionConfig, SelectionMode};
use crate::domain::Candidate;
use crate::error::{RefactorError, Result};
use crate::source;

/// Every file under `root` with the given extension, relative to `root` and sorted.
///
/// Hidden directories are skipped.
pub fn discover_sources(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        extension
    );
    let entries = glob::glob(&pattern)
        .map_err(|e| RefactorError::Selection(format!("Invalid source pattern {}: {}", pattern, e)))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .filter_map(|path| path.strip_prefix(root).ok().map(Path::to_path_buf))
        .filter(|relative| {
            !relative
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Yields the ordered list of candidates for a project
pub struct CandidateSelector {
    mode: SelectionMode,
    top_n: usize,
    extension: String,
    ranker: Box<dyn Ranker>,
}

impl CandidateSelector {
    pub fn new(mode: SelectionMode, top_n: usize, extension: impl Into<String>, ranker: Box<dyn Ranker>) -> Self {
        Self {
            mode,
            top_n,
            extension: extension.into(),
            ranker,
        }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.mode, config.top_n, config.extension.clone(), ranker_for(config))
    }

    pub fn ranker(&self) -> &dyn Ranker {
        self.ranker.as_ref()
    }

    pub fn select(&self, project_dir: &Path) -> Result<Vec<Candidate>> {
        let candidates = match self.mode {
            SelectionMode::All => self.all_sources(project_dir)?,
            SelectionMode::Ranked => self
                .ranker
                .rank(project_dir, self.top_n)?
                .into_iter()
                .map(|ranked| Candidate::new(ranked.name, ranked.relative_path))
                .collect(),
        };
        log::info!(
            "Selected {} candidate(s) from {} ({:?})",
            candidates.len(),
            project_dir.display(),
            self.mode
        );
        Ok(candidates)
    }

    fn all_sources(&self, project_dir: &Path) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::new();
        for relative in discover_sources(project_dir, &self.extension)? {
            if source::is_test_path(&relative) {
                continue;
            }
            let code = fs::read_to_string(project_dir.join(&relative))?;
            match source::class_name_for(&relative, &code) {
                Some(name) => candidates.push(Candidate::new(name, relative)),
                None => log::debug!("No class name for {}, skipping", relative.display()),
            }
        }
        Ok(candidates)
    }
}

/// The configured ranking oracle; PMD without a path degrades to the heuristic
pub fn ranker_for(config: &SelectionConfig) -> Box<dyn Ranker> {
    match (config.detector, &config.pmd_path) {
        (DetectorTool::Pmd, Some(path)) => Box::new(PmdRanker::new(path.clone(), config.extension.clone())),
        (DetectorTool::Pmd, None) => {
            log::warn!("Detector is pmd but no pmd_path is set, using heuristic ranking");
            Box::new(HeuristicRanker::new(config.extension.clone()))
        }
        (DetectorTool::Heuristic, _) => Box::new(HeuristicRanker::new(config.extension.clone())),
    }
}
