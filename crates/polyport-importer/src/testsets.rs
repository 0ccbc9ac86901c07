//! Test extraction and batching
//!
//! Copies every referenced test into the generated bundle under canonical
//! names, builds the group table for `complete-group` groups, validates
//! dependencies, and normalizes points to integers.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::archive::PackageArchive;
use crate::descriptor::{Descriptor, PointsPolicy};
use crate::error::{ImportError, ImportResult};
use crate::log::ImportLog;
use crate::types::{ImportContext, ProblemConfig, TestFilePair, TestItem};

/// Extract both testsets and produce the manifest skeleton.
///
/// The bundle name embeds the descriptor revision and the current time, so
/// re-imports never collide with a bundle the judge already serves.
pub fn parse_tests(context: &mut ImportContext) -> ImportResult<ProblemConfig> {
    let ImportContext {
        package,
        descriptor,
        log,
        temp_dir,
        ..
    } = context;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let archive = format!("tests-r{}-{timestamp}.zip", descriptor.revision);

    log.info(format!("Storing tests in {archive}"));
    let file = File::create(temp_dir.join(&archive))?;
    let mut storage = ZipWriter::new(file);

    let pretests = parse_testset(package, descriptor, log, &mut storage, "pretests")?;
    let tests = parse_testset(package, descriptor, log, &mut storage, "tests")?;
    storage.finish()?;

    let tests =
        tests.ok_or_else(|| ImportError::import("Testset \"tests\" is empty or missing"))?;

    for testset in &descriptor.testsets {
        if testset.name != "tests" && testset.name != "pretests" {
            log.warning(format!("Unsupported testset {}, skipping...", testset.name));
        }
    }

    Ok(ProblemConfig::new(archive, tests, pretests))
}

struct PendingBatch {
    points: f64,
    dependencies: Vec<usize>,
    batched: Vec<TestFilePair>,
}

enum PendingItem {
    Single { pair: TestFilePair, points: f64 },
    Batch(PendingBatch),
}

impl PendingItem {
    fn points(&self) -> f64 {
        match self {
            Self::Single { points, .. } => *points,
            Self::Batch(batch) => batch.points,
        }
    }
}

fn parse_testset(
    package: &mut PackageArchive,
    descriptor: &Descriptor,
    log: &ImportLog,
    storage: &mut ZipWriter<File>,
    name: &str,
) -> ImportResult<Option<Vec<TestItem>>> {
    let Some(testset) = descriptor.testset(name) else {
        return Ok(None);
    };
    if testset.tests.is_empty() {
        return Ok(None);
    }

    log.info(format!("Processing testset {name}"));

    let groups_enabled = testset.groups.is_some();
    let mut group_name_to_id: HashMap<&str, usize> = HashMap::new();
    let mut batches: Vec<PendingBatch> = Vec::new();

    if let Some(groups) = &testset.groups {
        for group in groups {
            match group.policy {
                PointsPolicy::EachTest => {
                    if !group.dependencies.is_empty() {
                        return Err(ImportError::import(
                            "Dependencies only supported for groups with complete-group policy",
                        ));
                    }
                }
                PointsPolicy::CompleteGroup => {
                    let mut dependencies = Vec::new();
                    for dependency in &group.dependencies {
                        let id = group_name_to_id.get(dependency.as_str()).ok_or_else(|| {
                            ImportError::import(format!(
                                "Group {} depends on group {dependency} that does not exist \
                                 or has each-test points policy",
                                group.name
                            ))
                        })?;
                        dependencies.push(*id);
                    }
                    batches.push(PendingBatch {
                        points: group.points,
                        dependencies,
                        batched: Vec::new(),
                    });
                    group_name_to_id.insert(group.name.as_str(), batches.len());
                }
            }
        }
    }

    let input_pattern = testset.input_pattern.as_deref().ok_or_else(|| {
        ImportError::import(format!("Testset {name} has no input-path-pattern"))
    })?;
    let answer_pattern = testset.answer_pattern.as_deref().ok_or_else(|| {
        ImportError::import(format!("Testset {name} has no answer-path-pattern"))
    })?;

    let mut ungrouped: Vec<(TestFilePair, f64)> = Vec::new();

    for (index, test) in testset.tests.iter().enumerate() {
        let index = index + 1;
        let input_path = expand_pattern(input_pattern, index)?;
        let output_path = expand_pattern(answer_pattern, index)?;

        if !package.contains(&input_path) {
            return Err(ImportError::import(format!(
                "Input file {input_path} for test {index} is missing"
            )));
        }
        if !package.contains(&output_path) {
            return Err(ImportError::import(format!(
                "Output file {output_path} for test {index} is missing"
            )));
        }

        let input_file = format!("{name}-{index:02}.inp");
        let output_file = format!("{name}-{index:02}.out");
        storage.start_file(input_file.as_str(), SimpleFileOptions::default())?;
        storage.write_all(&package.read(&input_path)?)?;
        storage.start_file(output_file.as_str(), SimpleFileOptions::default())?;
        storage.write_all(&package.read(&output_path)?)?;

        let pair = TestFilePair {
            input: input_file,
            output: output_file,
        };

        let batch_id = test
            .group
            .as_deref()
            .and_then(|group| group_name_to_id.get(group).copied());
        match batch_id {
            Some(id) => {
                if let Some(batch) = batches.get_mut(id - 1) {
                    batch.batched.push(pair);
                }
            }
            None => {
                if groups_enabled && test.points == 0.0 {
                    return Err(ImportError::import(
                        "All tests in groups with each-test policy should be scored",
                    ));
                }
                ungrouped.push((pair, test.points));
            }
        }
    }

    let batch_count = batches.len();
    let items: Vec<PendingItem> = ungrouped
        .into_iter()
        .map(|(pair, points)| PendingItem::Single { pair, points })
        .chain(batches.into_iter().map(PendingItem::Batch))
        .collect();

    let points = normalize_points(log, &items);
    let result: Vec<TestItem> = items
        .into_iter()
        .zip(points)
        .map(|(item, points)| match item {
            PendingItem::Single { pair, .. } => TestItem::Single {
                input: pair.input,
                output: pair.output,
                points,
            },
            PendingItem::Batch(batch) => TestItem::Batch {
                batched: batch.batched,
                points,
                dependencies: if batch.dependencies.is_empty() {
                    None
                } else {
                    Some(batch.dependencies)
                },
            },
        })
        .collect();

    let test_count: usize = result.iter().map(TestItem::test_count).sum();
    log.info(format!("Parsed {test_count} tests and {batch_count} batches"));

    Ok(Some(result))
}

/// Make all points integral while preserving their relative weights: when any
/// value is fractional, scale everything by 100 and divide by the common gcd.
#[allow(clippy::cast_possible_truncation)]
fn normalize_points(log: &ImportLog, items: &[PendingItem]) -> Vec<i64> {
    if items.iter().all(|item| item.points().fract() == 0.0) {
        return items.iter().map(|item| item.points() as i64).collect();
    }

    log.warning("FLOATING-POINT TEST POINTS ARE NOT SUPPORTED. NORMALIZING TO INTEGERS");
    let scaled: Vec<i64> = items
        .iter()
        .map(|item| (item.points() * 100.0).round() as i64)
        .collect();
    let common = scaled.iter().fold(0, |acc, &value| gcd(acc, value)).max(1);
    scaled.into_iter().map(|value| value / common).collect()
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a.abs()
}

/// Expand a printf-style path pattern (`%d`, zero-padded `%0Nd`) for one test
fn expand_pattern(pattern: &str, index: usize) -> ImportResult<String> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)] // the literal is well-formed
    let placeholder = PLACEHOLDER.get_or_init(|| Regex::new(r"%(?:0(\d+))?d").unwrap());

    let captures = placeholder.captures(pattern).ok_or_else(|| {
        ImportError::import(format!("Path pattern {pattern} has no integer placeholder"))
    })?;
    let width: usize = captures
        .get(1)
        .and_then(|w| w.as_str().parse().ok())
        .unwrap_or(0);

    Ok(placeholder
        .replace(pattern, format!("{index:0width$}"))
        .into_owned())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::testutil::context_from;

    #[test]
    fn pattern_expansion_pads_the_index() {
        assert_eq!(expand_pattern("tests/%02d", 3).unwrap(), "tests/03");
        assert_eq!(expand_pattern("tests/%d.a", 12).unwrap(), "tests/12.a");
        assert!(expand_pattern("tests/static", 1).is_err());
    }

    #[test]
    fn gcd_handles_zeroes() {
        assert_eq!(gcd(0, 50), 50);
        assert_eq!(gcd(50, 75), 25);
        assert_eq!(gcd(0, 0), 0);
    }

    fn grouped_xml() -> &'static str {
        r#"
        <problem revision="3">
            <judging>
                <testset name="tests">
                    <time-limit>1000</time-limit>
                    <memory-limit>268435456</memory-limit>
                    <input-path-pattern>tests/%02d</input-path-pattern>
                    <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                    <tests>
                        <test group="1"/>
                        <test group="1"/>
                        <test group="1"/>
                        <test group="2"/>
                        <test group="2"/>
                        <test group="2"/>
                    </tests>
                    <groups>
                        <group name="1" points="50" points-policy="complete-group"/>
                        <group name="2" points="50" points-policy="complete-group">
                            <dependencies><dependency group="1"/></dependencies>
                        </group>
                    </groups>
                </testset>
            </judging>
        </problem>
        "#
    }

    fn six_tests() -> Vec<(String, Vec<u8>)> {
        let mut members = Vec::new();
        for index in 1..=6 {
            members.push((format!("tests/{index:02}"), format!("{index}\n").into_bytes()));
            members.push((format!("tests/{index:02}.a"), b"ok\n".to_vec()));
        }
        members
    }

    #[test]
    fn grouped_tests_become_batches_with_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        let members = six_tests();
        let mut context = context_from(dir.path(), &members, grouped_xml());

        let config = parse_tests(&mut context).unwrap();
        assert!(config.archive.starts_with("tests-r3-"));
        assert_eq!(config.test_cases.len(), 2);

        let TestItem::Batch {
            batched,
            points,
            dependencies,
        } = &config.test_cases[0]
        else {
            panic!("expected a batch");
        };
        assert_eq!(batched.len(), 3);
        assert_eq!(*points, 50);
        assert!(dependencies.is_none());

        let TestItem::Batch { dependencies, .. } = &config.test_cases[1] else {
            panic!("expected a batch");
        };
        assert_eq!(dependencies.as_deref(), Some(&[1][..]));

        // The bundle exists and holds canonical member names
        let bundle = dir.path().join(&config.archive);
        let mut zip = zip::ZipArchive::new(std::fs::File::open(bundle).unwrap()).unwrap();
        assert!(zip.by_name("tests-01.inp").is_ok());
        assert!(zip.by_name("tests-06.out").is_ok());
    }

    #[test]
    fn each_test_policy_keeps_tests_flat() {
        let xml = r#"
        <problem revision="1">
            <judging>
                <testset name="tests">
                    <input-path-pattern>tests/%02d</input-path-pattern>
                    <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                    <tests>
                        <test points="25" group="1"/>
                        <test points="25" group="1"/>
                        <test points="25" group="1"/>
                        <test points="25" group="1"/>
                    </tests>
                    <groups>
                        <group name="1" points-policy="each-test"/>
                    </groups>
                </testset>
            </judging>
        </problem>
        "#;
        let dir = tempfile::tempdir().unwrap();
        let mut members = six_tests();
        members.truncate(8);
        let mut context = context_from(dir.path(), &members, xml);

        let config = parse_tests(&mut context).unwrap();
        assert_eq!(config.test_cases.len(), 4);
        for item in &config.test_cases {
            assert!(matches!(item, TestItem::Single { points: 25, .. }));
        }
    }

    #[test]
    fn fractional_points_are_scaled_and_reduced() {
        let xml = r#"
        <problem revision="1">
            <judging>
                <testset name="tests">
                    <input-path-pattern>tests/%02d</input-path-pattern>
                    <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                    <tests>
                        <test points="0.5"/>
                        <test points="0.25"/>
                    </tests>
                </testset>
            </judging>
        </problem>
        "#;
        let dir = tempfile::tempdir().unwrap();
        let mut members = six_tests();
        members.truncate(4);
        let mut context = context_from(dir.path(), &members, xml);

        let config = parse_tests(&mut context).unwrap();
        let points: Vec<i64> = config.test_cases.iter().map(TestItem::points).collect();
        assert_eq!(points, vec![2, 1]);
        assert!(context
            .log
            .contents()
            .contains("NORMALIZING TO INTEGERS"));
    }

    #[test]
    fn dependency_on_each_test_group_fails_before_writing() {
        let xml = r#"
        <problem revision="1">
            <judging>
                <testset name="tests">
                    <input-path-pattern>tests/%02d</input-path-pattern>
                    <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                    <tests><test points="1" group="2"/></tests>
                    <groups>
                        <group name="1" points-policy="each-test"/>
                        <group name="2" points="10" points-policy="complete-group">
                            <dependencies><dependency group="1"/></dependencies>
                        </group>
                    </groups>
                </testset>
            </judging>
        </problem>
        "#;
        let dir = tempfile::tempdir().unwrap();
        let members = six_tests();
        let mut context = context_from(dir.path(), &members, xml);

        let error = parse_tests(&mut context).unwrap_err();
        assert!(error.to_string().contains("depends on group 1"));
    }

    #[test]
    fn missing_tests_testset_is_fatal() {
        let xml = r#"
        <problem revision="1">
            <judging>
                <testset name="pretests">
                    <input-path-pattern>tests/%02d</input-path-pattern>
                    <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                    <tests><test points="1"/></tests>
                </testset>
            </judging>
        </problem>
        "#;
        let dir = tempfile::tempdir().unwrap();
        let members = six_tests();
        let mut context = context_from(dir.path(), &members, xml);

        let error = parse_tests(&mut context).unwrap_err();
        assert!(error
            .to_string()
            .contains("Testset \"tests\" is empty or missing"));
    }

    #[test]
    fn missing_test_file_is_reported_with_its_path() {
        let xml = r#"
        <problem revision="1">
            <judging>
                <testset name="tests">
                    <input-path-pattern>tests/%02d</input-path-pattern>
                    <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                    <tests><test points="1"/><test points="1"/></tests>
                </testset>
            </judging>
        </problem>
        "#;
        let dir = tempfile::tempdir().unwrap();
        // Only test 1 is present
        let members = vec![
            ("tests/01".to_string(), b"1\n".to_vec()),
            ("tests/01.a".to_string(), b"ok\n".to_vec()),
        ];
        let mut context = context_from(dir.path(), &members, xml);

        let error = parse_tests(&mut context).unwrap_err();
        assert!(error
            .to_string()
            .contains("Input file tests/02 for test 2 is missing"));
    }

    #[test]
    fn zero_point_test_under_each_test_policy_is_rejected() {
        let xml = r#"
        <problem revision="1">
            <judging>
                <testset name="tests">
                    <input-path-pattern>tests/%02d</input-path-pattern>
                    <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                    <tests><test/></tests>
                    <groups>
                        <group name="1" points-policy="each-test"/>
                    </groups>
                </testset>
            </judging>
        </problem>
        "#;
        let dir = tempfile::tempdir().unwrap();
        let members = six_tests();
        let mut context = context_from(dir.path(), &members, xml);

        let error = parse_tests(&mut context).unwrap_err();
        assert!(error
            .to_string()
            .contains("All tests in groups with each-test policy should be scored"));
    }
}
