//! Polygon client errors

use thiserror::Error;

/// Result type alias for Polygon API operations
pub type PolygonResult<T> = std::result::Result<T, PolygonError>;

/// Failures talking to the Polygon API
#[derive(Debug, Error)]
pub enum PolygonError {
    /// Transport-level failure
    #[error("Polygon transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body was not the expected JSON envelope
    #[error("Polygon responded with code {code}: {body}")]
    BadResponse { code: u16, body: String },

    /// Envelope status was not OK
    #[error("Polygon request failed: {comment}")]
    Failed { comment: String },

    /// `problems.list` returned nothing for the id
    #[error("Problem {id} does not exist or user {user} has no access to it")]
    ProblemNotFound { id: i64, user: String },

    /// `problems.list` returned several problems for one id
    #[error("Invalid Polygon response: multiple problems for ID {id}")]
    AmbiguousProblem { id: i64 },

    /// Package download answered with a non-200 status
    #[error("Polygon returned unexpected status code {0}")]
    UnexpectedStatus(u16),

    /// Writing the downloaded package to disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
