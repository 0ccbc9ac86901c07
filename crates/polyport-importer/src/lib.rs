//! Polygon package import pipeline
//!
//! Turns a problem authored on Codeforces Polygon into a fully provisioned
//! problem on the local judge: metadata, statements converted from LaTeX to
//! Markdown, content-addressed images, a batched test bundle, checker or
//! interactor sources, and the `init.yml` manifest. Jobs run on a background
//! worker that reports named stages and captures a per-run log.

pub mod archive;
pub mod assembler;
pub mod assets;
pub mod compilers;
pub mod descriptor;
pub mod error;
pub mod job;
pub mod locale;
pub mod log;
pub mod reporter;
pub mod statement;
pub mod testsets;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use archive::PackageArchive;
pub use descriptor::Descriptor;
pub use error::{ImportError, ImportResult};
pub use job::{run_import, ImportJob, ImportServices};
pub use log::ImportLog;
pub use reporter::{NullReporter, TaskReporter, TaskState};
pub use statement::pandoc::PandocConverter;
pub use types::{ImportContext, ProblemConfig, Statement, TestItem};
pub use worker::{DispatchError, ImportDispatcher, ImportWorker};
