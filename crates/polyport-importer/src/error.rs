//! Import pipeline errors
//!
//! `Import` is the single domain kind: malformed packages, missing members,
//! bad dependency graphs, duplicate codes. Infrastructure failures keep their
//! native types and convert via `#[from]`.

use thiserror::Error;

/// Result type alias for import operations
pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Failures of an import job
#[derive(Debug, Error)]
pub enum ImportError {
    /// Domain failure: the package or request violates import rules
    #[error("{0}")]
    Import(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Package ZIP could not be read or written
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// problem.xml is not well-formed
    #[error("descriptor error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// problem-properties.json or init.yml serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Polygon API failure
    #[error(transparent)]
    Polygon(#[from] polyport_polygon::PolygonError),

    /// Host judge failure
    #[error(transparent)]
    Judge(#[from] polyport_judge::JudgeError),

    /// Data layer failure
    #[error(transparent)]
    Database(#[from] polyport_meta_data::DatabaseError),

    /// The Markdown converter exited non-zero
    #[error("pandoc failed with status {status}: {stderr}")]
    Pandoc { status: i32, stderr: String },
}

impl ImportError {
    /// Shorthand for the domain kind
    pub fn import(message: impl Into<String>) -> Self {
        Self::Import(message.into())
    }
}
