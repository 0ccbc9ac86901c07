//! Domain models for database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persistent record of an import target: one Polygon problem mapped to one
/// judge problem code.
///
/// Judge-side entities (profiles, problems, submissions) are referenced by
/// their opaque numeric ids; the judge itself is an external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProblemSource {
    pub id: Uuid,
    pub polygon_id: i64,
    pub author_id: i64,
    pub problem_code: String,

    /// Link to the created judge problem; null until the first successful
    /// import
    pub problem_id: Option<i64>,

    /// Submission created from the package's main solution; used to detect
    /// unchanged source across re-imports
    pub main_submission_id: Option<i64>,

    pub created_at: DateTime<Utc>,
}

/// One import attempt for a `ProblemSource`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProblemSourceImport {
    pub id: Uuid,
    pub problem_source_id: Uuid,
    pub author_id: i64,
    #[sqlx(try_from = "String")]
    pub status: ImportStatus,
    pub log: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status of an import attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Processing,
    Completed,
    Failed,
}

impl std::str::FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid import status: {s}")),
        }
    }
}

impl TryFrom<String> for ImportStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{status}")
    }
}
