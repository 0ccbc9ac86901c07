//! Checker and interactor selection
//!
//! A problem gets exactly one of the two: the interactor wins when present,
//! the checker is required otherwise. Sources and `files/testlib.h` are
//! staged into the job's temp directory for later placement in the problem's
//! data directory.

use std::path::Path;

use crate::archive::PackageArchive;
use crate::error::{ImportError, ImportResult};
use crate::types::{Checker, CheckerArgs, Grader, ImportContext, ProblemConfig};

const TESTLIB_MEMBER: &str = "files/testlib.h";

fn extract(
    package: &mut PackageArchive,
    member: &str,
    destination: &Path,
) -> ImportResult<()> {
    let bytes = package.read(member)?;
    std::fs::write(destination, bytes)?;
    Ok(())
}

/// Fill `config.checker` or `config.interactive` from the descriptor
pub fn parse_assets(context: &mut ImportContext, config: &mut ProblemConfig) -> ImportResult<()> {
    let ImportContext {
        package,
        descriptor,
        log,
        temp_dir,
        ..
    } = context;

    // Polygon supports hiding checker comments via a tag
    let feedback = !descriptor.has_tag("hide_checker_comment");

    if let Some(interactor) = &descriptor.interactor {
        log.info("Problem is interactive");

        let path = interactor
            .source_path
            .as_deref()
            .ok_or_else(|| ImportError::import("Interactor has no source"))?;
        if !path.to_lowercase().ends_with(".cpp") {
            return Err(ImportError::import("Only C++ interactors are supported"));
        }

        extract(package, TESTLIB_MEMBER, &temp_dir.join("testlib.h"))?;
        extract(package, path, &temp_dir.join("interactor.cpp"))?;

        config.interactive = Some(Grader::testlib(
            vec!["interactor.cpp".to_string(), "testlib.h".to_string()],
            feedback,
        ));
        config.unbuffered = Some(true);

        log.warning("The judge does not support checker and interactor at the same time");
        log.info("Your checker should ALWAYS accept; all checks belong in the interactor");
        return Ok(());
    }

    log.info("Problem is non-interactive, adding checker");

    let source_path = descriptor
        .checker
        .as_ref()
        .filter(|checker| checker.kind.as_deref() == Some("testlib"))
        .and_then(|checker| checker.source_path.as_deref())
        .ok_or_else(|| ImportError::import("Checker is missing or not well-formed"))?;

    if !source_path.to_lowercase().ends_with(".cpp") {
        return Err(ImportError::import("Only C++ checkers are supported"));
    }

    extract(package, TESTLIB_MEMBER, &temp_dir.join("testlib.h"))?;
    extract(package, source_path, &temp_dir.join("checker.cpp"))?;

    config.checker = Some(Checker::bridged(CheckerArgs::testlib(
        vec!["checker.cpp".to_string(), "testlib.h".to_string()],
        feedback,
    )));

    Ok(())
}
