//! Database repository trait for dependency injection and testing

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseResult;
use crate::models::{ImportStatus, ProblemSource, ProblemSourceImport};

/// Repository trait for all import-source persistence
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Create a new import target
    async fn create_source(
        &self,
        polygon_id: i64,
        author_id: i64,
        problem_code: &str,
    ) -> DatabaseResult<ProblemSource>;

    /// Get a source by id
    async fn get_source(&self, id: &Uuid) -> DatabaseResult<Option<ProblemSource>>;

    /// Whether any source already claims this problem code
    async fn code_in_use(&self, problem_code: &str) -> DatabaseResult<bool>;

    /// Record the judge problem created for this source
    async fn set_problem(&self, source_id: &Uuid, problem_id: i64) -> DatabaseResult<()>;

    /// Record the submission created from the package's main solution
    async fn set_main_submission(
        &self,
        source_id: &Uuid,
        submission_id: i64,
    ) -> DatabaseResult<()>;

    /// Open a new import attempt (status starts as Processing)
    async fn create_import(
        &self,
        source_id: &Uuid,
        author_id: i64,
    ) -> DatabaseResult<ProblemSourceImport>;

    /// Close an import attempt with its terminal status, captured log, and
    /// optional error text
    async fn finish_import(
        &self,
        import_id: &Uuid,
        status: ImportStatus,
        log: &str,
        error: Option<&str>,
    ) -> DatabaseResult<()>;

    /// Import attempts for a source, newest first
    async fn list_imports(&self, source_id: &Uuid) -> DatabaseResult<Vec<ProblemSourceImport>>;
}
