//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use polyport_importer::DispatchError;
use polyport_judge::JudgeError;
use polyport_meta_data::DatabaseError;
use polyport_polygon::PolygonError;

/// Result type alias for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Error shape returned to clients as `{"error": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error("permission denied")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(error: DatabaseError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<JudgeError> for ApiError {
    fn from(error: JudgeError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<PolygonError> for ApiError {
    fn from(error: PolygonError) -> Self {
        match error {
            // The user can act on these: wrong id, revoked access, bad package
            PolygonError::ProblemNotFound { .. }
            | PolygonError::AmbiguousProblem { .. }
            | PolygonError::Failed { .. }
            | PolygonError::BadResponse { .. } => Self::BadRequest(error.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::AlreadyRunning => Self::Conflict(error.to_string()),
            DispatchError::QueueFull => Self::Unavailable(error.to_string()),
        }
    }
}
