//! Judge boundary errors

use thiserror::Error;

/// Result type alias for judge operations
pub type JudgeResult<T> = std::result::Result<T, JudgeError>;

/// Errors crossing the judge boundary
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Filesystem failure in the media store or data directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Referenced judge entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Submission language is not registered on the judge
    #[error("unknown judge language: {0}")]
    UnknownLanguage(String),

    /// Anything else the host judge reports
    #[error("judge error: {0}")]
    Other(String),
}
