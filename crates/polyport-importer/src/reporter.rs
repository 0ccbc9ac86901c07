//! Progress reporting for import jobs

use serde::Serialize;

/// Capability handed to a job for reporting named stages.
///
/// The worker runtime is the only real implementer; tests use
/// [`NullReporter`].
pub trait TaskReporter: Send + Sync {
    fn report(&self, stage: &str);
}

/// Job states exposed to the polling UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Picked up, no stage reported yet
    Working { stage: Option<String> },
    /// `done` of `total` named stages reached
    Progress { done: u32, total: u32, stage: String },
    Success,
    Failure { error: String },
}

/// Reporter that drops every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl TaskReporter for NullReporter {
    fn report(&self, _stage: &str) {}
}
