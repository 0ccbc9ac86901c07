//! Problem assembly and persistence
//!
//! Merges the parsed parts into one atomic judge save, stages the supporting
//! files after the database commit, sweeps stale data, and keeps the author's
//! main solution judged.

use polyport_judge::{
    ArchiveAttachment, JudgeClient as _, JudgeOptions, MediaStore as _, ProblemId, ProfileId,
    SaveProblemRequest, SubmissionId, Translation,
};
use polyport_meta_data::SourceRepository as _;

use crate::archive::PackageArchive;
use crate::compilers;
use crate::descriptor::Descriptor;
use crate::error::{ImportError, ImportResult};
use crate::job::ImportServices;
use crate::log::ImportLog;
use crate::types::{ImportContext, MainSolution, ProblemConfig, Statement};

/// Merge statements, limits, and points into the judge save request.
///
/// When the descriptor assigns no points at all, the problem becomes
/// non-partial with a single point on the final test.
pub fn prepare_properties(
    context: &mut ImportContext,
    services: &ImportServices,
    config: &mut ProblemConfig,
    statements: Vec<Statement>,
) -> ImportResult<SaveProblemRequest> {
    let judge_config = &services.config.judge;
    let main_language = judge_config
        .default_language
        .split('-')
        .next()
        .unwrap_or(&judge_config.default_language);

    let main_statement = statements
        .iter()
        .find(|s| s.language.as_deref() == Some(main_language))
        .or_else(|| statements.first())
        .cloned()
        .ok_or_else(|| ImportError::import("Package produced no statements"))?;
    if main_statement.language.as_deref() != Some(main_language) {
        context.log.info(format!(
            "Statement in {main_language} not found, using {} as main",
            main_statement.language.as_deref().unwrap_or("none")
        ));
    }

    let other_statements: Vec<&Statement> = statements
        .iter()
        .filter(|s| s.language.is_some() && s.language != main_statement.language)
        .collect();

    let tutorial_parts: Vec<&str> = std::iter::once(&main_statement)
        .chain(other_statements.iter().copied())
        .filter_map(|s| s.tutorial.as_deref())
        .collect();
    let tutorial = if tutorial_parts.is_empty() {
        None
    } else {
        Some(tutorial_parts.join("\n\n----\n\n"))
    };

    let translations = other_statements
        .iter()
        .filter_map(|s| {
            s.language.as_ref().map(|language| Translation {
                language: language.clone(),
                name: s.name.clone(),
                description: s.description.clone(),
            })
        })
        .collect();

    let testset = context
        .descriptor
        .testset("tests")
        .ok_or_else(|| ImportError::import("Testset \"tests\" is empty or missing"))?;
    let time_limit_ms = testset
        .time_limit_ms
        .ok_or_else(|| ImportError::import("Testset tests has no time-limit"))?;
    let memory_limit_bytes = testset
        .memory_limit_bytes
        .ok_or_else(|| ImportError::import("Testset tests has no memory-limit"))?;

    let mut memory_limit = memory_limit_bytes / 1024;
    if let Some(min) = judge_config.min_memory_limit {
        memory_limit = memory_limit.max(min);
    }
    if let Some(max) = judge_config.max_memory_limit {
        memory_limit = memory_limit.min(max);
    }

    let mut total_points: i64 = config.test_cases.iter().map(crate::types::TestItem::points).sum();
    let partial = if total_points == 0 {
        context
            .log
            .info("No points configured, adding 1 point for the last testcase");
        total_points = 1;
        if let Some(last) = config.test_cases.last_mut() {
            last.set_points(1);
        }
        false
    } else {
        context
            .log
            .info(format!("Found points, total score: {total_points}"));
        true
    };

    let unicode = config
        .hints
        .as_ref()
        .is_some_and(|hints| hints.iter().any(|h| h == "unicode"));

    #[allow(clippy::cast_precision_loss)]
    let points = total_points as f64;

    Ok(SaveProblemRequest {
        code: context.source.problem_code.clone(),
        name: main_statement.name,
        time_limit: time_limit_ms / 1000.0,
        memory_limit,
        description: main_statement.description,
        partial,
        points,
        author: ProfileId(context.source.author_id),
        translations,
        tutorial,
        archive: ArchiveAttachment {
            name: config.archive.clone(),
            path: context.temp_dir.join(&config.archive),
            unicode,
        },
    })
}

/// Apply the save on the judge, then stage files into the problem's data
/// directory.
///
/// The judge applies the request in one transaction; nothing touches the
/// data directory until that commit succeeds.
pub async fn save_problem(
    context: &ImportContext,
    services: &ImportServices,
    config: &ProblemConfig,
    request: &SaveProblemRequest,
) -> ImportResult<ProblemId> {
    let problem = services.judge.save_problem(request).await?;
    context.log.info(format!(
        "Saved problem {} as judge problem {problem}",
        request.code
    ));

    let problem_path = services
        .config
        .judge
        .problem_data_root
        .join(&context.source.problem_code);
    tokio::fs::create_dir_all(&problem_path).await?;

    tokio::fs::copy(
        context.temp_dir.join(&config.archive),
        problem_path.join(&config.archive),
    )
    .await?;

    for file in config.asset_files() {
        tokio::fs::copy(context.temp_dir.join(&file), problem_path.join(&file)).await?;
    }

    tokio::fs::write(
        problem_path.join("init.yml"),
        serde_json::to_string(config)?,
    )
    .await?;

    Ok(problem)
}

/// Drop data-directory entries and media uploads older imports left behind
pub async fn cleanup(
    context: &ImportContext,
    services: &ImportServices,
    config: &ProblemConfig,
) -> ImportResult<()> {
    let mut expected = vec!["init.yml".to_string(), config.archive.clone()];
    expected.extend(config.asset_files());

    let problem_path = services
        .config
        .judge
        .problem_data_root
        .join(&context.source.problem_code);

    let mut entries = tokio::fs::read_dir(&problem_path).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if expected.contains(&name) {
            continue;
        }
        if entry.file_type().await?.is_dir() {
            context.log.info(format!("Removing old directory {name}"));
            tokio::fs::remove_dir_all(entry.path()).await?;
        } else {
            context.log.info(format!("Removing old file {name}"));
            tokio::fs::remove_file(entry.path()).await?;
        }
    }

    let media_root = format!("problems/{}", context.source.problem_code);
    if services.media.exists(&media_root).await {
        for item in services.media.list_dir(&media_root).await? {
            if item != context.upload_id {
                services
                    .media
                    .remove_tree(&format!("{media_root}/{item}"))
                    .await?;
            }
        }
    }

    Ok(())
}

fn package_solution(
    package: &mut PackageArchive,
    descriptor: &Descriptor,
    log: &ImportLog,
) -> ImportResult<Option<MainSolution>> {
    let Some(solution) = &descriptor.main_solution else {
        log.warning("Problem has no main correct solution");
        return Ok(None);
    };

    let path = solution
        .source_path
        .as_deref()
        .ok_or_else(|| ImportError::import("No source for main solution"))?;

    let source_type = solution.source_type.as_deref().unwrap_or("<missing>");
    let Some(language) = compilers::judge_language(source_type) else {
        log.warning(format!(
            "Main solution has unsupported type {source_type}, skipping..."
        ));
        return Ok(None);
    };

    let bytes = package.read(path)?;
    let Ok(source) = String::from_utf8(bytes) else {
        log.warning("Main solution is not a valid Unicode file, skipping...");
        return Ok(None);
    };

    Ok(Some(MainSolution {
        language: language.to_string(),
        source,
    }))
}

/// Submit or re-judge the package's main solution.
///
/// An unchanged source re-judges the existing submission instead of creating
/// a new row.
pub async fn judge_main_submission(
    context: &mut ImportContext,
    services: &ImportServices,
    problem: ProblemId,
    author: ProfileId,
) -> ImportResult<()> {
    let ImportContext {
        package,
        descriptor,
        log,
        source,
        ..
    } = context;

    let Some(solution) = package_solution(package, descriptor, log)? else {
        return Ok(());
    };

    let cached = match source.main_submission_id {
        Some(id) => services
            .judge
            .submission(SubmissionId(id))
            .await?
            .map(|record| MainSolution {
                language: record.language,
                source: record.source,
            }),
        None => None,
    };

    if cached.as_ref() == Some(&solution) {
        log.info("Main correct solution is not changed, rejudging");
        if let Some(id) = source.main_submission_id {
            services
                .judge
                .enqueue_judge(
                    SubmissionId(id),
                    JudgeOptions {
                        force: true,
                        rejudge: true,
                    },
                )
                .await?;
        }
        return Ok(());
    }

    log.info("Submitting main correct solution");
    let submission = services
        .judge
        .create_submission(problem, &solution.language, author, &solution.source)
        .await?;
    services
        .sources
        .set_main_submission(&source.id, submission.0)
        .await?;
    source.main_submission_id = Some(submission.0);
    services
        .judge
        .enqueue_judge(
            submission,
            JudgeOptions {
                force: true,
                rejudge: false,
            },
        )
        .await?;

    Ok(())
}
