//! Structured error handling for the data layer

use thiserror::Error;

/// Result type alias for database operations
pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

/// Errors produced by the data layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A query failed; `operation` names what we were doing
    #[error("database error during {operation}: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Schema migration failed
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row we expected to exist was missing
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

/// Extension trait attaching an operation name to `sqlx` errors
pub trait DatabaseErrorExt<T> {
    fn map_db_err(self, operation: &'static str) -> DatabaseResult<T>;
}

impl<T> DatabaseErrorExt<T> for Result<T, sqlx::Error> {
    fn map_db_err(self, operation: &'static str) -> DatabaseResult<T> {
        self.map_err(|source| DatabaseError::Query { operation, source })
    }
}
