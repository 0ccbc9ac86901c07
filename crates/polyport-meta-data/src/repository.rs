//! `PostgreSQL` implementation of the source repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DatabaseErrorExt, DatabaseResult};
use crate::models::{ImportStatus, ProblemSource, ProblemSourceImport};
use crate::traits::SourceRepository;

/// Repository backed by a `PostgreSQL` connection pool
#[derive(Debug, Clone)]
pub struct DbSourceRepository {
    pool: PgPool,
}

impl DbSourceRepository {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRepository for DbSourceRepository {
    async fn create_source(
        &self,
        polygon_id: i64,
        author_id: i64,
        problem_code: &str,
    ) -> DatabaseResult<ProblemSource> {
        sqlx::query_as::<_, ProblemSource>(
            r"
            INSERT INTO problem_sources (id, polygon_id, author_id, problem_code)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(polygon_id)
        .bind(author_id)
        .bind(problem_code)
        .fetch_one(&self.pool)
        .await
        .map_db_err("create_source")
    }

    async fn get_source(&self, id: &Uuid) -> DatabaseResult<Option<ProblemSource>> {
        sqlx::query_as::<_, ProblemSource>("SELECT * FROM problem_sources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_db_err("get_source")
    }

    async fn code_in_use(&self, problem_code: &str) -> DatabaseResult<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM problem_sources WHERE problem_code = $1)",
        )
        .bind(problem_code)
        .fetch_one(&self.pool)
        .await
        .map_db_err("code_in_use")?;

        Ok(row.0)
    }

    async fn set_problem(&self, source_id: &Uuid, problem_id: i64) -> DatabaseResult<()> {
        sqlx::query("UPDATE problem_sources SET problem_id = $2 WHERE id = $1")
            .bind(source_id)
            .bind(problem_id)
            .execute(&self.pool)
            .await
            .map_db_err("set_problem")?;

        Ok(())
    }

    async fn set_main_submission(
        &self,
        source_id: &Uuid,
        submission_id: i64,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE problem_sources SET main_submission_id = $2 WHERE id = $1")
            .bind(source_id)
            .bind(submission_id)
            .execute(&self.pool)
            .await
            .map_db_err("set_main_submission")?;

        Ok(())
    }

    async fn create_import(
        &self,
        source_id: &Uuid,
        author_id: i64,
    ) -> DatabaseResult<ProblemSourceImport> {
        sqlx::query_as::<_, ProblemSourceImport>(
            r"
            INSERT INTO problem_source_imports (id, problem_source_id, author_id, status)
            VALUES ($1, $2, $3, 'processing')
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(source_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_db_err("create_import")
    }

    async fn finish_import(
        &self,
        import_id: &Uuid,
        status: ImportStatus,
        log: &str,
        error: Option<&str>,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r"
            UPDATE problem_source_imports
            SET status = $2, log = $3, error = $4, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(import_id)
        .bind(status.to_string())
        .bind(log)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_db_err("finish_import")?;

        Ok(())
    }

    async fn list_imports(&self, source_id: &Uuid) -> DatabaseResult<Vec<ProblemSourceImport>> {
        sqlx::query_as::<_, ProblemSourceImport>(
            r"
            SELECT * FROM problem_source_imports
            WHERE problem_source_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(source_id)
        .fetch_all(&self.pool)
        .await
        .map_db_err("list_imports")
    }
}
