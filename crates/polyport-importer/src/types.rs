//! Records produced and consumed by the import pipeline

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use polyport_meta_data::ProblemSource;

use crate::archive::PackageArchive;
use crate::descriptor::Descriptor;
use crate::log::ImportLog;

/// One test's input/output member names inside the generated bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestFilePair {
    #[serde(rename = "in")]
    pub input: String,
    #[serde(rename = "out")]
    pub output: String,
}

/// One entry of `test_cases` in the emitted manifest: either a single scored
/// test or a batch graded all-or-nothing.
///
/// `dependencies` holds 1-based indices of earlier batches in the same
/// testset and is omitted when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TestItem {
    Single {
        #[serde(rename = "in")]
        input: String,
        #[serde(rename = "out")]
        output: String,
        points: i64,
    },
    Batch {
        batched: Vec<TestFilePair>,
        points: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        dependencies: Option<Vec<usize>>,
    },
}

impl TestItem {
    pub fn points(&self) -> i64 {
        match self {
            Self::Single { points, .. } | Self::Batch { points, .. } => *points,
        }
    }

    pub(crate) fn set_points(&mut self, value: i64) {
        match self {
            Self::Single { points, .. } | Self::Batch { points, .. } => *points = value,
        }
    }

    /// Number of concrete tests behind this item
    pub fn test_count(&self) -> usize {
        match self {
            Self::Single { .. } => 1,
            Self::Batch { batched, .. } => batched.len(),
        }
    }
}

/// Checker invocation arguments
#[derive(Debug, Clone, Serialize)]
pub struct CheckerArgs {
    pub files: Vec<String>,
    pub feedback: bool,
    pub lang: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl CheckerArgs {
    pub fn testlib(files: Vec<String>, feedback: bool) -> Self {
        Self {
            files,
            feedback,
            lang: "CPP20".to_string(),
            kind: "testlib".to_string(),
        }
    }
}

/// Bridged checker entry of the manifest
#[derive(Debug, Clone, Serialize)]
pub struct Checker {
    pub args: CheckerArgs,
    pub name: String,
}

impl Checker {
    pub fn bridged(args: CheckerArgs) -> Self {
        Self {
            args,
            name: "bridged".to_string(),
        }
    }
}

/// Interactive grader entry of the manifest
#[derive(Debug, Clone, Serialize)]
pub struct Grader {
    pub files: Vec<String>,
    pub feedback: bool,
    pub lang: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Grader {
    pub fn testlib(files: Vec<String>, feedback: bool) -> Self {
        Self {
            files,
            feedback,
            lang: "CPP20".to_string(),
            kind: "testlib".to_string(),
        }
    }
}

/// The problem-configuration manifest, serialized as JSON into `init.yml`
/// with null fields omitted
#[derive(Debug, Clone, Serialize)]
pub struct ProblemConfig {
    pub archive: String,
    pub test_cases: Vec<TestItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretest_test_cases: Option<Vec<TestItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checker: Option<Checker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive: Option<Grader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unbuffered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<String>>,
}

impl ProblemConfig {
    pub fn new(archive: String, test_cases: Vec<TestItem>, pretests: Option<Vec<TestItem>>) -> Self {
        Self {
            archive,
            test_cases,
            pretest_test_cases: pretests,
            checker: None,
            interactive: None,
            unbuffered: None,
            hints: None,
        }
    }

    /// Every staged supporting file referenced by the manifest
    pub fn asset_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        if let Some(checker) = &self.checker {
            files.extend(checker.args.files.iter().cloned());
        }
        if let Some(interactive) = &self.interactive {
            files.extend(interactive.files.iter().cloned());
        }
        files
    }
}

/// One converted statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub name: String,
    /// GitHub-flavored Markdown
    pub description: String,
    pub language: Option<String>,
    pub tutorial: Option<String>,
}

/// The package's reference solution, normalized to a judge language key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainSolution {
    pub language: String,
    pub source: String,
}

/// Per-job state threaded through the pipeline stages.
///
/// Created when a job starts, dropped when it ends; never shared across jobs.
pub struct ImportContext {
    /// Snapshot of the import target row
    pub source: ProblemSource,
    pub package: PackageArchive,
    pub descriptor: Descriptor,
    pub log: ImportLog,
    /// Scratch directory, deleted by the job when it exits
    pub temp_dir: PathBuf,
    /// Short random hex namespacing this job's media uploads
    pub upload_id: String,
    /// sha1 of image bytes -> public URL, deduping within the job
    pub image_cache: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn manifest_omits_null_fields() {
        let config = ProblemConfig::new(
            "tests-r1-10.zip".to_string(),
            vec![TestItem::Single {
                input: "tests-01.inp".to_string(),
                output: "tests-01.out".to_string(),
                points: 1,
            }],
            None,
        );
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "archive": "tests-r1-10.zip",
                "test_cases": [{"in": "tests-01.inp", "out": "tests-01.out", "points": 1}],
            })
        );
    }

    #[test]
    fn batch_serializes_batched_list_and_dependencies() {
        let item = TestItem::Batch {
            batched: vec![TestFilePair {
                input: "tests-01.inp".to_string(),
                output: "tests-01.out".to_string(),
            }],
            points: 50,
            dependencies: Some(vec![1]),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "batched": [{"in": "tests-01.inp", "out": "tests-01.out"}],
                "points": 50,
                "dependencies": [1],
            })
        );
    }
}
