//! Narrow interface to the host judge
//!
//! The importer provisions problems on a judge it does not own: problem rows,
//! translations, solutions, submissions, and media files. This crate defines
//! that boundary as traits (`JudgeClient`, `MediaStore`) plus the request
//! types that cross it, a filesystem-backed media store, and in-memory mocks
//! for tests. The judge application itself implements `JudgeClient`.

pub mod error;
pub mod media;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{JudgeError, JudgeResult};
pub use media::FsMediaStore;
pub use mock::{MemoryMediaStore, MockJudgeClient};
pub use traits::{JudgeClient, MediaStore};
pub use types::{
    ArchiveAttachment, JudgeOptions, ProblemId, ProfileId, SaveProblemRequest, SubmissionId,
    SubmissionRecord, Translation,
};
