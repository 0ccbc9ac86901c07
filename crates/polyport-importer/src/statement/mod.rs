//! Statement conversion and image ingestion
//!
//! Each TeX statement in the package becomes one Markdown [`Statement`]: the
//! sections of `problem-properties.json` are converted through pandoc,
//! samples are appended with locale-aware headings, and every referenced
//! image is stored content-addressed in the media store.

pub mod pandoc;

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use polyport_judge::MediaStore;

use crate::archive::PackageArchive;
use crate::error::{ImportError, ImportResult};
use crate::locale::{heading, sample_heading, Section};
use crate::statement::pandoc::PandocConverter;
use crate::types::{ImportContext, Statement};

/// Polygon statement languages mapped to judge language codes
const POLYGON_LANGUAGES: &[(&str, &str)] = &[
    ("catalan", "ca"),
    ("german", "de"),
    ("greek", "el"),
    ("english", "en"),
    ("spanish", "es"),
    ("french", "fr"),
    ("croatian", "hr"),
    ("hungarian", "hu"),
    ("japanese", "ja"),
    ("kazakh", "kk"),
    ("korean", "ko"),
    ("portuguese", "pt"),
    ("romanian", "ro"),
    ("russian", "ru"),
    ("serbian", "sr-latn"),
    ("turkish", "tr"),
    ("vietnamese", "vi"),
    ("chinese", "zh-hans"),
];

fn judge_language_code(polygon_language: &str) -> Option<&'static str> {
    POLYGON_LANGUAGES
        .iter()
        .find(|(polygon, _)| *polygon == polygon_language)
        .map(|(_, judge)| *judge)
}

/// The slice of `problem-properties.json` the importer consumes
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StatementProperties {
    legend: Option<String>,
    input: Option<String>,
    output: Option<String>,
    interaction: Option<String>,
    scoring: Option<String>,
    sample_tests: Vec<SampleTest>,
    notes: Option<String>,
    tutorial: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SampleTest {
    input: String,
    output: String,
}

fn header(text: &str, level: usize) -> String {
    format!("\n{} {text}\n\n", "#".repeat(level))
}

fn non_empty(field: Option<&String>) -> Option<&str> {
    field.map(String::as_str).filter(|s| !s.is_empty())
}

/// Convert all TeX statements of the package.
///
/// An empty statement list yields a single anonymous placeholder named from
/// the descriptor so the problem still gets created.
pub async fn parse_statements(
    context: &mut ImportContext,
    pandoc: &PandocConverter,
    media: &dyn MediaStore,
) -> ImportResult<Vec<Statement>> {
    let ImportContext {
        source,
        package,
        descriptor,
        log,
        upload_id,
        image_cache,
        ..
    } = context;

    let statement_blocks: Vec<_> = descriptor
        .statements
        .iter()
        .filter(|block| block.kind.as_deref() == Some("application/x-tex"))
        .collect();

    if statement_blocks.is_empty() {
        log.warning("Statement not found, skipping...");
        let name = descriptor.name_for(None).unwrap_or("Unnamed").to_string();
        return Ok(vec![Statement {
            name,
            description: String::new(),
            language: None,
            tutorial: None,
        }]);
    }

    let mut statements = Vec::new();
    let mut existing_languages: BTreeSet<String> = BTreeSet::new();

    for block in statement_blocks {
        let origin_language = block.language.as_deref().unwrap_or("unknown").to_string();
        let language = match judge_language_code(&origin_language) {
            Some(code) => code.to_string(),
            None => {
                log.warning(format!(
                    "Unknown language {origin_language}. \
                     Statement will be saved, but it's never to be shown"
                ));
                origin_language.clone()
            }
        };

        if !existing_languages.insert(language.clone()) {
            log.warning(format!("Duplicate language {language}, skipping..."));
            continue;
        }

        log.info(format!("Adding statement in {language}"));

        let statement_folder = block
            .path
            .as_deref()
            .and_then(|path| path.rsplit_once('/').map(|(folder, _)| folder))
            .unwrap_or("")
            .to_string();
        let properties_path = if statement_folder.is_empty() {
            "problem-properties.json".to_string()
        } else {
            format!("{statement_folder}/problem-properties.json")
        };
        if !package.contains(&properties_path) {
            return Err(ImportError::import(format!(
                "problem-properties.json not found at path {properties_path}"
            )));
        }

        let properties: StatementProperties =
            serde_json::from_slice(&package.read(&properties_path)?)?;

        let mut description = build_description(pandoc, &language, &properties).await?;
        description = process_images(
            package,
            image_cache,
            media,
            &source.problem_code,
            upload_id,
            &statement_folder,
            description,
        )
        .await?;

        let name = descriptor
            .name_for(Some(&origin_language))
            .unwrap_or("")
            .to_string();

        let tutorial = match non_empty(properties.tutorial.as_ref()) {
            Some(tex) => {
                let converted = pandoc.tex_to_markdown(tex).await?;
                Some(
                    process_images(
                        package,
                        image_cache,
                        media,
                        &source.problem_code,
                        upload_id,
                        &statement_folder,
                        converted,
                    )
                    .await?,
                )
            }
            None => None,
        };

        statements.push(Statement {
            name,
            description,
            language: Some(language),
            tutorial,
        });
    }

    Ok(statements)
}

/// Convert the statement sections in their canonical order
async fn build_description(
    pandoc: &PandocConverter,
    language: &str,
    properties: &StatementProperties,
) -> ImportResult<String> {
    let mut description = pandoc
        .tex_to_markdown(properties.legend.as_deref().unwrap_or(""))
        .await?;

    let sections = [
        (Section::Input, &properties.input),
        (Section::Output, &properties.output),
        (Section::Interaction, &properties.interaction),
        (Section::Scoring, &properties.scoring),
    ];
    for (section, content) in sections {
        if let Some(tex) = non_empty(content.as_ref()) {
            description.push_str(&header(heading(language, section), 2));
            description.push_str(&pandoc.tex_to_markdown(tex).await?);
        }
    }

    if !properties.sample_tests.is_empty() {
        description.push_str(&header(heading(language, Section::Samples), 2));
        for (index, sample) in properties.sample_tests.iter().enumerate() {
            let index = index + 1;
            description.push_str(&header(&sample_heading(language, Section::Input, index), 3));
            description.push_str(&format!("```\n{}\n```\n", sample.input.trim()));
            description.push_str(&header(
                &sample_heading(language, Section::Output, index),
                3,
            ));
            description.push_str(&format!("```\n{}\n```\n", sample.output.trim()));
        }
    }

    if let Some(tex) = non_empty(properties.notes.as_ref()) {
        description.push_str(&header(heading(language, Section::Notes), 2));
        description.push_str(&pandoc.tex_to_markdown(tex).await?);
    }

    Ok(description)
}

/// Rewrite every image reference to a content-addressed media URL.
///
/// Identical bytes upload once per job; the cache maps sha1 to the stored
/// URL.
pub(crate) async fn process_images(
    package: &mut PackageArchive,
    image_cache: &mut HashMap<String, String>,
    media: &dyn MediaStore,
    problem_code: &str,
    upload_id: &str,
    statement_folder: &str,
    text: String,
) -> ImportResult<String> {
    static MD_IMAGE: OnceLock<Regex> = OnceLock::new();
    static IMG_TAG: OnceLock<Regex> = OnceLock::new();
    static IMG_SRC: OnceLock<Regex> = OnceLock::new();

    #[allow(clippy::unwrap_used)] // the literals are well-formed
    let md_image = MD_IMAGE.get_or_init(|| Regex::new(r"!\[image\]\((.+?)\)").unwrap());
    #[allow(clippy::unwrap_used)]
    let img_tag = IMG_TAG.get_or_init(|| Regex::new(r"<\s*img[^>]*>").unwrap());
    #[allow(clippy::unwrap_used)]
    let img_src =
        IMG_SRC.get_or_init(|| Regex::new(r#"<\s*img[^>]+src\s*=\s*(["'])(.*?)\1[^>]*>"#).unwrap());

    let mut text = text;

    let markdown_paths: BTreeSet<String> = md_image
        .captures_iter(&text)
        .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
        .collect();
    for image_path in markdown_paths {
        let url = save_image(
            package,
            image_cache,
            media,
            problem_code,
            upload_id,
            statement_folder,
            &image_path,
        )
        .await?;
        text = text.replace(
            &format!("![image]({image_path})"),
            &format!("![image]({url})"),
        );
    }

    let tags: BTreeSet<String> = img_tag
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();
    for tag in tags {
        let image_path = img_src
            .captures(&tag)
            .and_then(|captures| captures.get(2))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ImportError::import(format!("img tag without src: {tag}")))?;
        let url = save_image(
            package,
            image_cache,
            media,
            problem_code,
            upload_id,
            statement_folder,
            &image_path,
        )
        .await?;
        text = text.replace(&tag, &tag.replace(&image_path, &url));
    }

    Ok(text)
}

async fn save_image(
    package: &mut PackageArchive,
    image_cache: &mut HashMap<String, String>,
    media: &dyn MediaStore,
    problem_code: &str,
    upload_id: &str,
    statement_folder: &str,
    image_path: &str,
) -> ImportResult<String> {
    let member = normalize_member_path(statement_folder, image_path);
    let bytes = package.read(&member)?;
    let digest = hex::encode(Sha1::digest(&bytes));

    if let Some(url) = image_cache.get(&digest) {
        return Ok(url.clone());
    }

    let basename = image_path.rsplit('/').next().unwrap_or(image_path);
    let stored = format!("problems/{problem_code}/{upload_id}/{digest}_{basename}");
    media.save(&stored, &bytes).await?;

    let url = media.url(&stored);
    image_cache.insert(digest, url.clone());
    Ok(url)
}

/// Join and normalize a `/`-separated member path, resolving `.` and `..`
fn normalize_member_path(base: &str, relative: &str) -> String {
    let joined = if base.is_empty() {
        relative.to_string()
    } else {
        format!("{base}/{relative}")
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    parts.join("/")
}
