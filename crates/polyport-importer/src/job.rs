//! One import job, start to end
//!
//! Validates the target, downloads the package, runs the pipeline stages in
//! order, and records the attempt with its captured log. Any failure rolls
//! back this job's media uploads; the database stays consistent because all
//! judge mutations live in the assembler's atomic save.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use polyport_config::ApplicationConfig;
use polyport_judge::{JudgeClient, MediaStore, ProfileId};
use polyport_meta_data::{ImportStatus, ProblemSource, SourceRepository};
use polyport_polygon::PolygonClient;

use crate::archive::PackageArchive;
use crate::assembler;
use crate::assets;
use crate::descriptor::Descriptor;
use crate::error::{ImportError, ImportResult};
use crate::log::ImportLog;
use crate::reporter::TaskReporter;
use crate::statement;
use crate::statement::pandoc::PandocConverter;
use crate::testsets;
use crate::types::ImportContext;

/// Maximum problem code length, matching the judge's column
pub const MAX_CODE_LENGTH: usize = 20;

/// Everything a job needs from the outside world
pub struct ImportServices {
    pub polygon: PolygonClient,
    pub judge: Arc<dyn JudgeClient>,
    pub media: Arc<dyn MediaStore>,
    pub sources: Arc<dyn SourceRepository>,
    pub pandoc: PandocConverter,
    pub config: ApplicationConfig,
}

/// One dispatched import
#[derive(Debug, Clone)]
pub struct ImportJob {
    pub source_id: Uuid,
    /// Profile triggering the import; submissions are created as this user
    pub author: ProfileId,
}

/// Check a candidate problem code against the judge's rules
pub fn validate_problem_code(code: &str) -> ImportResult<()> {
    static CODE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)] // the literal is well-formed
    let pattern = CODE.get_or_init(|| Regex::new("^[a-z0-9]+$").unwrap());

    if code.len() > MAX_CODE_LENGTH {
        return Err(ImportError::import(format!(
            "Problem code must be at most {MAX_CODE_LENGTH} characters"
        )));
    }
    if !pattern.is_match(code) {
        return Err(ImportError::import("Problem code must be ^[a-z0-9]+$"));
    }
    Ok(())
}

/// Resolve and download the latest ready linux package
pub async fn prepare_archive(
    log: &ImportLog,
    polygon: &PolygonClient,
    problem_id: i64,
    destination: &Path,
) -> ImportResult<()> {
    let problem = polygon.problem(problem_id).await?;

    let latest = problem
        .latest_package
        .ok_or_else(|| ImportError::import("No packages generated for problem"))?;

    let packages = polygon.problem_packages(problem_id).await?;

    let linux_package = packages
        .iter()
        .find(|p| p.revision == latest && p.kind == "linux")
        .ok_or_else(|| {
            ImportError::import(
                "Only Standard package is generated for the latest revision. \
                 Generate Full package.",
            )
        })?;

    if !linux_package.is_ready() {
        return Err(ImportError::import(
            "Latest package is not ready for download",
        ));
    }

    polygon
        .save_package(problem_id, linux_package.id, destination, "linux")
        .await?;

    if latest != problem.revision {
        log.warning(format!(
            "There is no package for latest revision {}",
            problem.revision
        ));
    }

    Ok(())
}

/// Run the pipeline stages over an opened package
pub async fn handle_import(
    context: &mut ImportContext,
    services: &ImportServices,
    reporter: &dyn TaskReporter,
    author: ProfileId,
) -> ImportResult<()> {
    context.log.info(format!(
        "Importing problem revision {}",
        context.descriptor.revision
    ));

    reporter.report("Processing testsets");
    let mut config = testsets::parse_tests(context)?;
    reporter.report("Processing assets");
    assets::parse_assets(context, &mut config)?;

    let upload_dir = format!(
        "problems/{}/{}",
        context.source.problem_code, context.upload_id
    );

    let saved = async {
        reporter.report("Processing statements");
        let statements =
            statement::parse_statements(context, &services.pandoc, services.media.as_ref())
                .await?;

        reporter.report("Saving problem");
        let request =
            assembler::prepare_properties(context, services, &mut config, statements)?;
        let problem = assembler::save_problem(context, services, &config, &request).await?;

        services
            .sources
            .set_problem(&context.source.id, problem.0)
            .await?;
        context.source.problem_id = Some(problem.0);

        Ok::<_, ImportError>(problem)
    }
    .await;

    let problem = match saved {
        Ok(problem) => problem,
        Err(error) => {
            // Roll back this job's media uploads; the judge transaction never
            // committed
            services.media.remove_tree(&upload_dir).await.ok();
            return Err(error);
        }
    };

    assembler::cleanup(context, services, &config).await?;

    assembler::judge_main_submission(context, services, problem, author).await?;

    Ok(())
}

async fn run_pipeline(
    source: ProblemSource,
    job: &ImportJob,
    services: &ImportServices,
    reporter: &dyn TaskReporter,
    log: &ImportLog,
) -> ImportResult<()> {
    let problem_code = source.problem_code.clone();
    validate_problem_code(&problem_code)?;
    if source.problem_id.is_none() && services.judge.problem_exists(&problem_code).await? {
        return Err(ImportError::import(format!(
            "Problem with code {problem_code} already exists"
        )));
    }

    // Deleted with everything staged in it when the job ends, success or not
    let temp_dir = tempfile::tempdir()?;
    let archive_path = temp_dir.path().join("archive.zip");

    reporter.report("Downloading problem archive");
    prepare_archive(log, &services.polygon, source.polygon_id, &archive_path).await?;

    let mut package = PackageArchive::open(&archive_path)?;
    let descriptor_xml = package.descriptor_xml()?;
    let descriptor = Descriptor::parse(&descriptor_xml)?;

    let upload_id = hex::encode(rand::thread_rng().gen::<[u8; 4]>());

    let mut context = ImportContext {
        source,
        package,
        descriptor,
        log: log.clone(),
        temp_dir: temp_dir.path().to_path_buf(),
        upload_id,
        image_cache: HashMap::new(),
    };

    handle_import(&mut context, services, reporter, job.author).await
}

/// Entry point the worker calls for each dispatched job.
///
/// Opens the attempt row, runs the pipeline, and closes the row with the
/// terminal status, the captured log, and the stringified error on failure.
pub async fn run_import(
    job: &ImportJob,
    services: &ImportServices,
    reporter: &dyn TaskReporter,
) -> ImportResult<()> {
    let source = services
        .sources
        .get_source(&job.source_id)
        .await?
        .ok_or_else(|| {
            ImportError::import(format!("Unknown problem source {}", job.source_id))
        })?;

    let attempt = services
        .sources
        .create_import(&source.id, job.author.0)
        .await?;

    let log = ImportLog::new();
    let result = run_pipeline(source, job, services, reporter, &log).await;

    match &result {
        Ok(()) => {
            services
                .sources
                .finish_import(&attempt.id, ImportStatus::Completed, &log.contents(), None)
                .await?;
        }
        Err(error) => {
            log.error(format!("Failed to import problem: {error}"));
            services
                .sources
                .finish_import(
                    &attempt.id,
                    ImportStatus::Failed,
                    &log.contents(),
                    Some(&error.to_string()),
                )
                .await?;
        }
    }

    result
}
