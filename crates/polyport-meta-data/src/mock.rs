//! Mock implementation of `SourceRepository` for testing

// Allow test-specific patterns in mock implementation
#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning
#![allow(clippy::expect_used)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::DatabaseResult;
use crate::models::{ImportStatus, ProblemSource, ProblemSourceImport};
use crate::traits::SourceRepository;

type SourceMap = Arc<Mutex<HashMap<Uuid, ProblemSource>>>;
type ImportMap = Arc<Mutex<HashMap<Uuid, ProblemSourceImport>>>;

/// In-memory repository for testing
#[derive(Clone, Default)]
pub struct MockSourceRepository {
    pub sources: SourceMap,
    pub imports: ImportMap,
}

impl MockSourceRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a source directly, bypassing the trait
    pub fn insert_source(&self, source: ProblemSource) {
        self.sources.lock().unwrap().insert(source.id, source);
    }
}

#[async_trait]
impl SourceRepository for MockSourceRepository {
    async fn create_source(
        &self,
        polygon_id: i64,
        author_id: i64,
        problem_code: &str,
    ) -> DatabaseResult<ProblemSource> {
        let source = ProblemSource {
            id: Uuid::new_v4(),
            polygon_id,
            author_id,
            problem_code: problem_code.to_string(),
            problem_id: None,
            main_submission_id: None,
            created_at: Utc::now(),
        };
        self.insert_source(source.clone());
        Ok(source)
    }

    async fn get_source(&self, id: &Uuid) -> DatabaseResult<Option<ProblemSource>> {
        Ok(self.sources.lock().unwrap().get(id).cloned())
    }

    async fn code_in_use(&self, problem_code: &str) -> DatabaseResult<bool> {
        Ok(self
            .sources
            .lock()
            .unwrap()
            .values()
            .any(|s| s.problem_code == problem_code))
    }

    async fn set_problem(&self, source_id: &Uuid, problem_id: i64) -> DatabaseResult<()> {
        if let Some(source) = self.sources.lock().unwrap().get_mut(source_id) {
            source.problem_id = Some(problem_id);
        }
        Ok(())
    }

    async fn set_main_submission(
        &self,
        source_id: &Uuid,
        submission_id: i64,
    ) -> DatabaseResult<()> {
        if let Some(source) = self.sources.lock().unwrap().get_mut(source_id) {
            source.main_submission_id = Some(submission_id);
        }
        Ok(())
    }

    async fn create_import(
        &self,
        source_id: &Uuid,
        author_id: i64,
    ) -> DatabaseResult<ProblemSourceImport> {
        let import = ProblemSourceImport {
            id: Uuid::new_v4(),
            problem_source_id: *source_id,
            author_id,
            status: ImportStatus::Processing,
            log: None,
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.imports.lock().unwrap().insert(import.id, import.clone());
        Ok(import)
    }

    async fn finish_import(
        &self,
        import_id: &Uuid,
        status: ImportStatus,
        log: &str,
        error: Option<&str>,
    ) -> DatabaseResult<()> {
        if let Some(import) = self.imports.lock().unwrap().get_mut(import_id) {
            import.status = status;
            import.log = Some(log.to_string());
            import.error = error.map(ToString::to_string);
            import.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_imports(&self, source_id: &Uuid) -> DatabaseResult<Vec<ProblemSourceImport>> {
        let mut imports: Vec<ProblemSourceImport> = self
            .imports
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.problem_source_id == *source_id)
            .cloned()
            .collect();
        imports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(imports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn import_lifecycle_round_trips() {
        let repo = MockSourceRepository::new();
        let source = repo.create_source(101, 7, "aplusb").await.unwrap();
        assert!(repo.code_in_use("aplusb").await.unwrap());
        assert!(!repo.code_in_use("other").await.unwrap());

        let import = repo.create_import(&source.id, 7).await.unwrap();
        assert_eq!(import.status, ImportStatus::Processing);

        repo.finish_import(&import.id, ImportStatus::Failed, "INFO:x\n", Some("boom"))
            .await
            .unwrap();
        let imports = repo.list_imports(&source.id).await.unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].status, ImportStatus::Failed);
        assert_eq!(imports[0].error.as_deref(), Some("boom"));
    }
}
