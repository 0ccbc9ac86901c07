//! Per-job import log
//!
//! Every record goes to the process-wide `tracing` subscriber and, in
//! `LEVEL:message` form, into a job-owned buffer that lands on the
//! `ProblemSourceImport` row when the job terminates.

use polyport_common::CaptureBuffer;

/// Job-scoped logger; clones share the captured buffer
#[derive(Debug, Clone, Default)]
pub struct ImportLog {
    buffer: CaptureBuffer,
}

impl ImportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::info!("{message}");
        self.buffer.push_line(&format!("INFO:{message}"));
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::warn!("{message}");
        self.buffer.push_line(&format!("WARNING:{message}"));
    }

    pub fn error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::error!("{message}");
        self.buffer.push_line(&format!("ERROR:{message}"));
    }

    /// The captured log so far
    pub fn contents(&self) -> String {
        self.buffer.contents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_captured_with_levels() {
        let log = ImportLog::new();
        log.info("Processing testset tests");
        log.warning("Unsupported testset extra, skipping...");
        assert_eq!(
            log.contents(),
            "INFO:Processing testset tests\nWARNING:Unsupported testset extra, skipping...\n"
        );
    }
}
