//! Request and identifier types crossing the judge boundary

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Judge problem row id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProblemId(pub i64);

/// Judge user profile id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub i64);

/// Judge submission row id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub i64);

impl std::fmt::Display for ProblemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One non-main statement stored as a problem translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub language: String,
    pub name: String,
    pub description: String,
}

/// The generated test bundle to attach to the problem's data row
#[derive(Debug, Clone)]
pub struct ArchiveAttachment {
    /// Filename under the problem's data directory
    pub name: String,
    /// Staged file to ingest
    pub path: PathBuf,
    /// Whether test files should be treated as unicode text
    pub unicode: bool,
}

/// Everything the judge applies in one transaction when a problem is saved.
///
/// Implementations upsert the problem row by `code`, make sure allowed
/// languages cover every registered language, add `author` to the problem's
/// authors, assign the first type and group when unset, replace all
/// translations, replace the tutorial solution (deleting when `tutorial` is
/// `None`), and attach the archive. Either all of it lands or none of it.
#[derive(Debug, Clone)]
pub struct SaveProblemRequest {
    pub code: String,
    pub name: String,
    /// Seconds
    pub time_limit: f64,
    /// KB
    pub memory_limit: u64,
    pub description: String,
    pub partial: bool,
    pub points: f64,
    pub author: ProfileId,
    pub translations: Vec<Translation>,
    pub tutorial: Option<String>,
    pub archive: ArchiveAttachment,
}

/// A submission with its stored source, as needed for change detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    /// Judge language key, e.g. `CPP17`
    pub language: String,
    pub source: String,
}

/// How a submission enters the judging queue
#[derive(Debug, Clone, Copy, Default)]
pub struct JudgeOptions {
    /// Skip the pretest shortcut and judge on full data
    pub force: bool,
    /// Re-judge an existing submission instead of a fresh judge
    pub rejudge: bool,
}
