//! Report generation.
//!
//! Computes the aggregate score and serializes metadata plus the full ledger
//! to the JSON artifact. Works on any ledger, including one loaded back from
//! a previously written report.

use crate::engine::ledger::Ledger;
use crate::engine::timestamp_now;
use crate::{Result, ValidatorError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

/// Pass ratio of a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub passed: usize,
    pub total: usize,
}

impl Score {
    pub fn of(ledger: &Ledger) -> Self {
        Score {
            passed: ledger.passed(),
            total: ledger.len(),
        }
    }

    /// Percentage of passed checks; an empty ledger scores 0
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.passed as f64 / self.total as f64
        }
    }

    /// Every check passed (and there was at least one)
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.percent())
    }
}

/// Report metadata block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub project: String,
    pub timestamp: String,
    pub score: String,
}

/// The report artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub tests: Ledger,
}

impl Report {
    /// Build a report from a finished ledger
    pub fn generate(project: &str, ledger: Ledger) -> Self {
        let score = Score::of(&ledger);
        Report {
            meta: ReportMeta {
                project: project.to_string(),
                timestamp: timestamp_now(),
                score: score.to_string(),
            },
            tests: ledger,
        }
    }

    /// Score recomputed from the ledger
    pub fn score(&self) -> Score {
        Score::of(&self.tests)
    }

    /// Pretty-printed JSON with 4-space indentation
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the report to `path`.
    ///
    /// The document is written to a sibling temporary file first and then
    /// renamed over the destination.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, json).map_err(|source| ValidatorError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            ValidatorError::ReportWrite {
                path: path.to_path_buf(),
                source,
            }
        })?;

        info!(path = %path.display(), score = %self.meta.score, "report written");
        Ok(())
    }

    /// Load a previously written report
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ValidatorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }
}
