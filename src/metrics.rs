//! Class-quality metrics used by the planner and the acceptance judge.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RefactorError, Result};
use crate::source;

/// Snapshot of one class's structural metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Non-blank lines of code
    pub loc: usize,
    /// Number of declared methods
    pub methods: usize,
    /// Number of declared fields
    pub fields: usize,
    /// Weighted methods per class: one per method plus one per decision point
    pub wmc: usize,
    pub imports: usize,
    /// Length in lines of the longest method
    pub max_method_loc: usize,
}

impl fmt::Display for ClassMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LOC={}, NOM={}, NOF={}, WMC={}, imports={}, longest method={} lines",
            self.loc, self.methods, self.fields, self.wmc, self.imports, self.max_method_loc
        )
    }
}

/// Computes quality metrics for a class source
pub trait MetricsExtractor: Send + Sync {
    fn extract(&self, source: &str) -> Result<ClassMetrics>;
}

/// Lexical approximation of the usual CK metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMetrics;

impl MetricsExtractor for HeuristicMetrics {
    fn extract(&self, source: &str) -> Result<ClassMetrics> {
        if source.trim().is_empty() {
            return Err(RefactorError::Metrics("source is empty".to_string()));
        }

        let lengths = source::method_lengths(source);
        let methods = lengths.len();
        let max_method_loc = lengths.iter().map(|(_, len)| *len).max().unwrap_or(0);

        Ok(ClassMetrics {
            loc: source::non_blank_lines(source),
            methods,
            fields: source::count_fields(source),
            wmc: methods + source::count_decision_points(source),
            imports: source::count_imports(source),
            max_method_loc,
        })
    }
}
