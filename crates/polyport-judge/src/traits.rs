//! Traits defining the judge boundary

use async_trait::async_trait;

use crate::error::JudgeResult;
use crate::types::{
    JudgeOptions, ProblemId, ProfileId, SaveProblemRequest, SubmissionId, SubmissionRecord,
};

/// Host judge operations the importer consumes.
///
/// The judge application provides the implementation; the importer never
/// reaches into judge storage directly.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Whether a problem row already claims this code
    async fn problem_exists(&self, code: &str) -> JudgeResult<bool>;

    /// Apply a [`SaveProblemRequest`] atomically and return the problem id
    async fn save_problem(&self, request: &SaveProblemRequest) -> JudgeResult<ProblemId>;

    /// Look up a submission with its stored source
    async fn submission(&self, id: SubmissionId) -> JudgeResult<Option<SubmissionRecord>>;

    /// Create a submission for `user` on `problem` with the given source
    async fn create_submission(
        &self,
        problem: ProblemId,
        language: &str,
        user: ProfileId,
        source: &str,
    ) -> JudgeResult<SubmissionId>;

    /// Put a submission into the judging queue
    async fn enqueue_judge(
        &self,
        submission: SubmissionId,
        options: JudgeOptions,
    ) -> JudgeResult<()>;

    /// Whether this profile may import problems at all
    async fn has_import_permission(&self, profile: ProfileId) -> JudgeResult<bool>;

    /// Whether this profile may edit an existing problem
    async fn is_problem_editor(&self, profile: ProfileId, problem: ProblemId)
        -> JudgeResult<bool>;
}

/// Media storage used for statement images.
///
/// Paths are relative, `/`-separated, and rooted at the judge's media root;
/// the same path appended to the media URL prefix is publicly reachable.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes under `path`, creating parent directories as needed
    async fn save(&self, path: &str, bytes: &[u8]) -> JudgeResult<()>;

    /// Whether anything exists at `path`
    async fn exists(&self, path: &str) -> bool;

    /// Names of entries directly under the directory `path`
    async fn list_dir(&self, path: &str) -> JudgeResult<Vec<String>>;

    /// Recursively delete the directory `path`; missing is not an error
    async fn remove_tree(&self, path: &str) -> JudgeResult<()>;

    /// Public URL for a stored path
    fn url(&self, path: &str) -> String;
}
