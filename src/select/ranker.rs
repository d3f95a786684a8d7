//! Ranking oracles for god-class detection.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use super::discover_sources;
use crate::error::{RefactorError, Result};
use crate::source;

/// Weight of one method relative to one line in the heuristic score
pub const METHOD_WEIGHT: usize = 20;

/// PMD ruleset whose findings count against a class
const PMD_RULESET: &str = "category/java/design.xml";

/// A class with its ranking score (higher is worse)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedClass {
    pub name: String,
    pub relative_path: PathBuf,
    pub score: usize,
}

/// Orders a project's classes from structurally worst to best
pub trait Ranker: Send + Sync {
    fn rank(&self, project_dir: &Path, top_n: usize) -> Result<Vec<RankedClass>>;

    fn name(&self) -> &'static str;
}

/// Scores each non-test class by non-blank lines plus weighted method count
#[derive(Debug, Clone)]
pub struct HeuristicRanker {
    extension: String,
}

impl HeuristicRanker {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn score(source: &str) -> usize {
        source::non_blank_lines(source) + source::count_methods(source) * METHOD_WEIGHT
    }
}

impl Ranker for HeuristicRanker {
    fn rank(&self, project_dir: &Path, top_n: usize) -> Result<Vec<RankedClass>> {
        let mut ranked = Vec::new();
        for relative in discover_sources(project_dir, &self.extension)? {
            if source::is_test_path(&relative) {
                continue;
            }
            let code = match fs::read_to_string(project_dir.join(&relative)) {
                Ok(code) => code,
                Err(e) => {
                    log::warn!("Skipping unreadable {}: {}", relative.display(), e);
                    continue;
                }
            };
            let Some(name) = source::class_name_for(&relative, &code) else {
                continue;
            };
            ranked.push(RankedClass {
                name,
                score: Self::score(&code),
                relative_path: relative,
            });
        }

        ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(top_n);
        Ok(ranked)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Ranks by the number of PMD design findings per file.
///
/// Falls back to the heuristic when PMD cannot be run or reports nothing.
#[derive(Debug, Clone)]
pub struct PmdRanker {
    pmd_path: PathBuf,
    fallback: HeuristicRanker,
}

impl PmdRanker {
    pub fn new(pmd_path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            pmd_path: pmd_path.into(),
            fallback: HeuristicRanker::new(extension),
        }
    }

    fn run_pmd(&self, project_dir: &Path) -> Result<String> {
        let output = Command::new(&self.pmd_path)
            .arg("-d")
            .arg(project_dir)
            .args(["-f", "text", "-R", PMD_RULESET])
            .output()
            .map_err(|e| RefactorError::Selection(format!("Failed to run {}: {}", self.pmd_path.display(), e)))?;

        // PMD exits non-zero whenever it finds violations, so the status says nothing useful
        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }

    fn rank_with_pmd(&self, project_dir: &Path, top_n: usize) -> Result<Vec<RankedClass>> {
        let report = self.run_pmd(project_dir)?;
        let counts = count_findings(&report);

        let mut ranked = Vec::new();
        for (path, score) in counts {
            let relative = path.strip_prefix(project_dir).unwrap_or(&path).to_path_buf();
            if source::is_test_path(&relative) {
                continue;
            }
            let Ok(code) = fs::read_to_string(&path) else {
                continue;
            };
            if let Some(name) = source::class_name_for(&relative, &code) {
                ranked.push(RankedClass {
                    name,
                    relative_path: relative,
                    score,
                });
            }
        }

        ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(top_n);
        Ok(ranked)
    }
}

impl Ranker for PmdRanker {
    fn rank(&self, project_dir: &Path, top_n: usize) -> Result<Vec<RankedClass>> {
        match self.rank_with_pmd(project_dir, top_n) {
            Ok(ranked) if !ranked.is_empty() => Ok(ranked),
            Ok(_) => {
                log::warn!("PMD reported no findings, falling back to heuristic ranking");
                self.fallback.rank(project_dir, top_n)
            }
            Err(e) => {
                log::warn!("PMD ranking failed, falling back to heuristic ranking: {}", e);
                self.fallback.rank(project_dir, top_n)
            }
        }
    }

    fn name(&self) -> &'static str {
        "pmd"
    }
}

/// Count `path:line:...` findings per existing file
fn count_findings(report: &str) -> HashMap<PathBuf, usize> {
    let mut counts = HashMap::new();
    for line in report.lines() {
        let mut parts = line.splitn(3, ':');
        let (Some(path), Some(_line), Some(_rest)) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        let path = PathBuf::from(path.trim());
        if path.is_file() {
            *counts.entry(path).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/main/java/Big.java",
            "public class Big {\n    void a() {\n    }\n    void b() {\n    }\n    void c() {\n    }\n}\n",
        );
        write(
            dir.path(),
            "src/main/java/Small.java",
            "public class Small {\n    void a() {\n    }\n}\n",
        );
        write(
            dir.path(),
            "src/test/java/BigTest.java",
            "public class BigTest {\n    void t1() {\n    }\n    void t2() {\n    }\n    void t3() {\n    }\n    void t4() {\n    }\n}\n",
        );
        dir
    }

    #[test]
    fn test_score() {
        assert_eq!(HeuristicRanker::score("class A {\n    void a() {\n    }\n}\n"), 4 + METHOD_WEIGHT);
    }

    #[test]
    fn test_heuristic_ranks_worst_first_and_skips_tests() {
        let dir = project();
        let ranked = HeuristicRanker::new("java").rank(dir.path(), 5).unwrap();

        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Big", "Small"]);
        assert_eq!(ranked[0].relative_path, PathBuf::from("src/main/java/Big.java"));
        assert_eq!(ranked[0].score, 8 + 3 * METHOD_WEIGHT);
    }

    #[test]
    fn test_heuristic_top_n() {
        let dir = project();
        let ranked = HeuristicRanker::new("java").rank(dir.path(), 1).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Big");
    }

    #[test]
    fn test_pmd_missing_binary_falls_back() {
        let dir = project();
        let ranker = PmdRanker::new("/nonexistent/pmd/bin/pmd", "java");
        let ranked = ranker.rank(dir.path(), 5).unwrap();
        assert_eq!(ranked[0].name, "Big");
    }

    #[test]
    fn test_count_findings() {
        let dir = project();
        let big = dir.path().join("src/main/java/Big.java");
        let report = format!(
            "{0}:1:\tGodClass:\tPossible God Class\n{0}:4:\tTooManyMethods:\tThis class has too many methods\n\
             /no/such/File.java:3:\tGodClass:\tx\nsummary line\n",
            big.display()
        );
        let counts = count_findings(&report);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&big], 2);
    }
}
