//! In-memory judge and media store for testing

// Allow test-specific patterns in mock implementations
#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning
#![allow(clippy::expect_used)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{JudgeError, JudgeResult};
use crate::traits::{JudgeClient, MediaStore};
use crate::types::{
    JudgeOptions, ProblemId, ProfileId, SaveProblemRequest, SubmissionId, SubmissionRecord,
};

/// Judge double that records everything the importer does to it
#[derive(Clone, Default)]
pub struct MockJudgeClient {
    inner: Arc<Mutex<MockJudgeState>>,
}

#[derive(Default)]
struct MockJudgeState {
    next_problem_id: i64,
    next_submission_id: i64,
    problems: HashMap<String, (ProblemId, SaveProblemRequest)>,
    submissions: HashMap<i64, SubmissionRecord>,
    judged: Vec<(SubmissionId, JudgeOptions)>,
    languages: HashSet<String>,
    importers: HashSet<i64>,
    editors: HashSet<(i64, i64)>,
}

impl MockJudgeClient {
    pub fn new() -> Self {
        let client = Self::default();
        {
            let mut state = client.inner.lock().unwrap();
            for key in ["CPP17", "CPP20", "PY3", "JAVA19"] {
                state.languages.insert(key.to_string());
            }
        }
        client
    }

    /// Grant the import-problems capability
    pub fn grant_import(&self, profile: ProfileId) {
        self.inner.lock().unwrap().importers.insert(profile.0);
    }

    /// Make a profile an editor of a problem
    pub fn grant_edit(&self, profile: ProfileId, problem: ProblemId) {
        self.inner.lock().unwrap().editors.insert((profile.0, problem.0));
    }

    /// Pre-create a problem row so `problem_exists` sees it
    pub fn seed_problem_code(&self, code: &str) {
        let mut state = self.inner.lock().unwrap();
        state.next_problem_id += 1;
        let id = ProblemId(state.next_problem_id);
        let request = SaveProblemRequest {
            code: code.to_string(),
            name: code.to_string(),
            time_limit: 1.0,
            memory_limit: 65536,
            description: String::new(),
            partial: false,
            points: 1.0,
            author: ProfileId(0),
            translations: Vec::new(),
            tutorial: None,
            archive: crate::types::ArchiveAttachment {
                name: "tests.zip".to_string(),
                path: std::path::PathBuf::new(),
                unicode: false,
            },
        };
        state.problems.insert(code.to_string(), (id, request));
    }

    /// The last save applied for a code
    pub fn saved_problem(&self, code: &str) -> Option<SaveProblemRequest> {
        self.inner
            .lock()
            .unwrap()
            .problems
            .get(code)
            .map(|(_, request)| request.clone())
    }

    /// All judge-queue entries so far
    pub fn judged(&self) -> Vec<(SubmissionId, JudgeOptions)> {
        self.inner.lock().unwrap().judged.clone()
    }

    /// Number of submissions ever created
    pub fn submission_count(&self) -> usize {
        self.inner.lock().unwrap().submissions.len()
    }
}

#[async_trait]
impl JudgeClient for MockJudgeClient {
    async fn problem_exists(&self, code: &str) -> JudgeResult<bool> {
        Ok(self.inner.lock().unwrap().problems.contains_key(code))
    }

    async fn save_problem(&self, request: &SaveProblemRequest) -> JudgeResult<ProblemId> {
        let mut state = self.inner.lock().unwrap();
        let id = match state.problems.get(&request.code) {
            Some((existing, _)) => *existing,
            None => {
                state.next_problem_id += 1;
                ProblemId(state.next_problem_id)
            }
        };
        state.problems.insert(request.code.clone(), (id, request.clone()));
        Ok(id)
    }

    async fn submission(&self, id: SubmissionId) -> JudgeResult<Option<SubmissionRecord>> {
        Ok(self.inner.lock().unwrap().submissions.get(&id.0).cloned())
    }

    async fn create_submission(
        &self,
        _problem: ProblemId,
        language: &str,
        _user: ProfileId,
        source: &str,
    ) -> JudgeResult<SubmissionId> {
        let mut state = self.inner.lock().unwrap();
        if !state.languages.contains(language) {
            return Err(JudgeError::UnknownLanguage(language.to_string()));
        }
        state.next_submission_id += 1;
        let id = SubmissionId(state.next_submission_id);
        state.submissions.insert(
            id.0,
            SubmissionRecord {
                id,
                language: language.to_string(),
                source: source.to_string(),
            },
        );
        Ok(id)
    }

    async fn enqueue_judge(
        &self,
        submission: SubmissionId,
        options: JudgeOptions,
    ) -> JudgeResult<()> {
        let mut state = self.inner.lock().unwrap();
        if !state.submissions.contains_key(&submission.0) {
            return Err(JudgeError::NotFound {
                entity: "submission",
                id: submission.to_string(),
            });
        }
        state.judged.push((submission, options));
        Ok(())
    }

    async fn has_import_permission(&self, profile: ProfileId) -> JudgeResult<bool> {
        Ok(self.inner.lock().unwrap().importers.contains(&profile.0))
    }

    async fn is_problem_editor(
        &self,
        profile: ProfileId,
        problem: ProblemId,
    ) -> JudgeResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .editors
            .contains(&(profile.0, problem.0)))
    }
}

/// Media store keeping everything in a map, for tests
#[derive(Clone, Default)]
pub struct MemoryMediaStore {
    files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    /// Bytes stored at a path
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn save(&self, path: &str, bytes: &[u8]) -> JudgeResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        let files = self.files.lock().unwrap();
        let dir_prefix = format!("{}/", path.trim_end_matches('/'));
        files.contains_key(path) || files.keys().any(|k| k.starts_with(&dir_prefix))
    }

    async fn list_dir(&self, path: &str) -> JudgeResult<Vec<String>> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut names: Vec<String> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(|rest| rest.split('/').next().unwrap_or(rest).to_string())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn remove_tree(&self, path: &str) -> JudgeResult<()> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.files
            .lock()
            .unwrap()
            .retain(|k, _| k != path && !k.starts_with(&prefix));
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("/media/{path}")
    }
}
