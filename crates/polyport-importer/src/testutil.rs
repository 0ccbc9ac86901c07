//! Shared fixtures for in-crate tests

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use polyport_meta_data::ProblemSource;

use crate::archive::test_support::package;
use crate::descriptor::Descriptor;
use crate::log::ImportLog;
use crate::types::ImportContext;

pub(crate) fn sample_source(code: &str) -> ProblemSource {
    ProblemSource {
        id: Uuid::new_v4(),
        polygon_id: 42,
        author_id: 7,
        problem_code: code.to_string(),
        problem_id: None,
        main_submission_id: None,
        created_at: Utc::now(),
    }
}

/// Build an import context over a package assembled from `members`, with the
/// given descriptor XML. `dir` doubles as the job's temp directory.
pub(crate) fn context_from(
    dir: &Path,
    members: &[(String, Vec<u8>)],
    xml: &str,
) -> ImportContext {
    let mut all: Vec<(&str, &[u8])> = members
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .collect();
    let xml_bytes = xml.as_bytes();
    if !members.iter().any(|(name, _)| name == "problem.xml") {
        all.push(("problem.xml", xml_bytes));
    }

    ImportContext {
        source: sample_source("aplusb"),
        package: package(dir, &all),
        descriptor: Descriptor::parse(xml).unwrap(),
        log: ImportLog::new(),
        temp_dir: dir.to_path_buf(),
        upload_id: "deadbeef".to_string(),
        image_cache: HashMap::new(),
    }
}
