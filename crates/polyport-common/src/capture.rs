//! Line-oriented capture buffer for per-job logs

use std::sync::{Arc, Mutex};

/// Shared append-only text buffer.
///
/// Import jobs mirror their log records into one of these so the full log can
/// be persisted with the job row once the job terminates. Clones share the
/// same underlying buffer.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    inner: Arc<Mutex<String>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line (a trailing newline is added).
    pub fn push_line(&self, line: &str) {
        if let Ok(mut buffer) = self.inner.lock() {
            buffer.push_str(line);
            buffer.push('\n');
        }
    }

    /// Snapshot of everything captured so far.
    pub fn contents(&self) -> String {
        self.inner.lock().map(|buffer| buffer.clone()).unwrap_or_default()
    }
}
