//! End-to-end import flow against a mocked Polygon API and judge
//!
//! Packages in these tests carry no TeX statements, so the pipeline runs
//! without a pandoc installation.

#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;

use polyport_config::ApplicationConfig;
use polyport_importer::worker::import_worker;
use polyport_importer::{ImportDispatcher, ImportServices, PandocConverter, TaskState};
use polyport_judge::{MemoryMediaStore, MockJudgeClient, ProfileId};
use polyport_meta_data::{ImportStatus, MockSourceRepository, SourceRepository};
use polyport_polygon::PolygonClient;

const AUTHOR: ProfileId = ProfileId(7);

fn package_zip(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(&mut cursor);
    for (name, bytes) in members {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
    cursor.into_inner()
}

const CHECKER_XML: &str = r#"
<problem revision="7" short-name="aplusb">
    <names><name language="english" value="A plus B"/></names>
    <judging>
        <testset name="tests">
            <time-limit>2000</time-limit>
            <memory-limit>268435456</memory-limit>
            <input-path-pattern>tests/%02d</input-path-pattern>
            <answer-path-pattern>tests/%02d.a</answer-path-pattern>
            <tests><test points="50"/><test points="50"/></tests>
        </testset>
    </judging>
    <assets>
        <checker type="testlib">
            <source path="check.cpp" type="cpp.g++17"/>
        </checker>
        <solutions>
            <solution tag="main">
                <source path="solutions/main.cpp" type="cpp.g++17"/>
            </solution>
        </solutions>
    </assets>
</problem>
"#;

fn checker_package() -> Vec<u8> {
    package_zip(&[
        ("problem.xml", CHECKER_XML.as_bytes()),
        ("tests/01", b"1 2\n"),
        ("tests/01.a", b"3\n"),
        ("tests/02", b"5 7\n"),
        ("tests/02.a", b"12\n"),
        ("check.cpp", b"// checker\n"),
        ("files/testlib.h", b"// testlib\n"),
        ("solutions/main.cpp", b"int main() { return 0; }\n"),
    ])
}

struct Fixture {
    judge: MockJudgeClient,
    sources: MockSourceRepository,
    media: MemoryMediaStore,
    dispatcher: ImportDispatcher,
    _server: mockito::ServerGuard,
}

async fn fixture(package: Vec<u8>, data_root: &Path) -> Fixture {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/problems.list")
        .match_query(Matcher::Any)
        .with_body(
            r#"{"status":"OK","result":[{
                "id": 42, "owner": "author", "name": "A plus B",
                "accessType": "OWNER", "revision": 7, "latestPackage": 7
            }]}"#,
        )
        .create_async()
        .await;
    server
        .mock("POST", "/problem.packages")
        .match_query(Matcher::Any)
        .with_body(
            r#"{"status":"OK","result":[{
                "id": 99, "revision": 7, "creationTimeSeconds": 0,
                "state": "READY", "comment": "", "type": "linux"
            }]}"#,
        )
        .create_async()
        .await;
    server
        .mock("POST", "/problem.package")
        .match_query(Matcher::Any)
        .with_body(package)
        .create_async()
        .await;

    let mut config = ApplicationConfig::from_env();
    config.polygon.api_url = format!("{}/", server.url());
    config.polygon.api_key = "key".to_string();
    config.polygon.api_secret = "secret".to_string();
    config.judge.default_language = "en".to_string();
    config.judge.problem_data_root = data_root.to_path_buf();
    config.worker.concurrency = 1;
    config.worker.queue_capacity = 8;

    let judge = MockJudgeClient::new();
    let sources = MockSourceRepository::new();
    let media = MemoryMediaStore::new();

    let services = Arc::new(ImportServices {
        polygon: PolygonClient::new(config.polygon.clone()),
        judge: Arc::new(judge.clone()),
        media: Arc::new(media.clone()),
        sources: Arc::new(sources.clone()),
        pandoc: PandocConverter::unchecked("pandoc"),
        config,
    });

    let (dispatcher, worker, _shutdown) = import_worker(services);
    tokio::spawn(worker.run());

    Fixture {
        judge,
        sources,
        media,
        dispatcher,
        _server: server,
    }
}

async fn wait_terminal(dispatcher: &ImportDispatcher, task_id: uuid::Uuid) -> TaskState {
    for _ in 0..1000 {
        if let Some(state) = dispatcher.task_state(&task_id) {
            if matches!(state, TaskState::Success | TaskState::Failure { .. }) {
                return state;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("import task did not reach a terminal state");
}

fn dir_entries(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn full_import_provisions_the_problem() {
    let data_root = tempfile::tempdir().unwrap();
    let fixture = fixture(checker_package(), data_root.path()).await;

    let source = fixture
        .sources
        .create_source(42, AUTHOR.0, "aplusb")
        .await
        .unwrap();
    let task_id = fixture.dispatcher.dispatch(source.id, AUTHOR).unwrap();

    assert_eq!(
        wait_terminal(&fixture.dispatcher, task_id).await,
        TaskState::Success
    );

    // Problem row, with limits converted and both tests scored
    let saved = fixture.judge.saved_problem("aplusb").unwrap();
    assert_eq!(saved.name, "A plus B");
    assert!((saved.time_limit - 2.0).abs() < f64::EPSILON);
    assert_eq!(saved.memory_limit, 262_144);
    assert!(saved.partial);
    assert!((saved.points - 100.0).abs() < f64::EPSILON);
    assert!(saved.translations.is_empty());

    // Data directory holds exactly the expected set
    let problem_dir = data_root.path().join("aplusb");
    let entries = dir_entries(&problem_dir);
    assert_eq!(entries.len(), 4);
    assert!(entries.contains(&"init.yml".to_string()));
    assert!(entries.contains(&"checker.cpp".to_string()));
    assert!(entries.contains(&"testlib.h".to_string()));
    assert!(entries.iter().any(|name| name.starts_with("tests-r7-")));

    // Manifest shape
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(problem_dir.join("init.yml")).unwrap())
            .unwrap();
    assert_eq!(manifest["test_cases"].as_array().unwrap().len(), 2);
    assert_eq!(manifest["test_cases"][0]["points"], 50);
    assert_eq!(manifest["checker"]["name"], "bridged");
    assert!(manifest.get("interactive").is_none());
    assert!(manifest.get("pretest_test_cases").is_none());

    // Source row updated, attempt recorded with its log
    let source = fixture.sources.get_source(&source.id).await.unwrap().unwrap();
    assert!(source.problem_id.is_some());
    assert!(source.main_submission_id.is_some());
    let imports = fixture.sources.list_imports(&source.id).await.unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].status, ImportStatus::Completed);
    assert!(imports[0]
        .log
        .as_deref()
        .unwrap()
        .contains("INFO:Processing testset tests"));

    // Main solution submitted once and force-judged
    assert_eq!(fixture.judge.submission_count(), 1);
    let judged = fixture.judge.judged();
    assert_eq!(judged.len(), 1);
    assert!(judged[0].1.force);
    assert!(!judged[0].1.rejudge);

    // No statements, no media
    assert!(fixture.media.paths().is_empty());
}

#[tokio::test]
async fn reimport_with_unchanged_solution_rejudges_in_place() {
    let data_root = tempfile::tempdir().unwrap();
    let fixture = fixture(checker_package(), data_root.path()).await;

    let source = fixture
        .sources
        .create_source(42, AUTHOR.0, "aplusb")
        .await
        .unwrap();

    let first = fixture.dispatcher.dispatch(source.id, AUTHOR).unwrap();
    assert_eq!(
        wait_terminal(&fixture.dispatcher, first).await,
        TaskState::Success
    );
    let submission_after_first = fixture
        .sources
        .get_source(&source.id)
        .await
        .unwrap()
        .unwrap()
        .main_submission_id;
    let manifest_path = data_root.path().join("aplusb").join("init.yml");
    let first_manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();

    let second = fixture.dispatcher.dispatch(source.id, AUTHOR).unwrap();
    assert_eq!(
        wait_terminal(&fixture.dispatcher, second).await,
        TaskState::Success
    );

    // Same submission row, rejudged rather than resubmitted
    assert_eq!(fixture.judge.submission_count(), 1);
    let source = fixture.sources.get_source(&source.id).await.unwrap().unwrap();
    assert_eq!(source.main_submission_id, submission_after_first);
    let judged = fixture.judge.judged();
    assert_eq!(judged.len(), 2);
    assert!(judged[1].1.rejudge);

    // Orphans from the first run are swept; the directory holds exactly the
    // current expected set
    let entries = dir_entries(&data_root.path().join("aplusb"));
    assert_eq!(entries.len(), 4);
    assert_eq!(
        entries
            .iter()
            .filter(|name| name.starts_with("tests-r7-"))
            .count(),
        1
    );

    // Both attempts on record, newest first
    let imports = fixture.sources.list_imports(&source.id).await.unwrap();
    assert_eq!(imports.len(), 2);
    assert!(imports
        .iter()
        .all(|attempt| attempt.status == ImportStatus::Completed));

    // The manifest is stable across identical imports (the archive name
    // embeds a timestamp, everything else must match)
    let second_manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(first_manifest["test_cases"], second_manifest["test_cases"]);
    assert_eq!(first_manifest["checker"], second_manifest["checker"]);
}

#[tokio::test]
async fn interactive_package_sets_grader_and_unbuffered() {
    let xml = r#"
    <problem revision="3" short-name="guess">
        <names><name language="english" value="Guess"/></names>
        <judging>
            <testset name="tests">
                <time-limit>1000</time-limit>
                <memory-limit>134217728</memory-limit>
                <input-path-pattern>tests/%02d</input-path-pattern>
                <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                <tests><test points="100"/></tests>
            </testset>
        </judging>
        <assets>
            <interactor>
                <source path="interactor.cpp" type="cpp.g++17"/>
            </interactor>
            <checker type="testlib">
                <source path="check.cpp" type="cpp.g++17"/>
            </checker>
        </assets>
        <tags><tag value="hide_checker_comment"/></tags>
    </problem>
    "#;
    let package = package_zip(&[
        ("problem.xml", xml.as_bytes()),
        ("tests/01", b"5\n"),
        ("tests/01.a", b"5\n"),
        ("interactor.cpp", b"// interactor\n"),
        ("check.cpp", b"// checker\n"),
        ("files/testlib.h", b"// testlib\n"),
    ]);

    let data_root = tempfile::tempdir().unwrap();
    let fixture = fixture(package, data_root.path()).await;
    let source = fixture
        .sources
        .create_source(43, AUTHOR.0, "guess")
        .await
        .unwrap();
    let task_id = fixture.dispatcher.dispatch(source.id, AUTHOR).unwrap();
    assert_eq!(
        wait_terminal(&fixture.dispatcher, task_id).await,
        TaskState::Success
    );

    let problem_dir = data_root.path().join("guess");
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(problem_dir.join("init.yml")).unwrap())
            .unwrap();
    assert!(manifest.get("checker").is_none());
    assert_eq!(manifest["unbuffered"], true);
    assert_eq!(manifest["interactive"]["feedback"], false);
    assert_eq!(
        manifest["interactive"]["files"],
        serde_json::json!(["interactor.cpp", "testlib.h"])
    );
    assert!(problem_dir.join("testlib.h").exists());
    assert!(problem_dir.join("interactor.cpp").exists());
    assert!(!problem_dir.join("checker.cpp").exists());
}

#[tokio::test]
async fn zero_total_points_become_one_point_on_the_last_test() {
    let xml = r#"
    <problem revision="2" short-name="nopoints">
        <names><name language="english" value="No points"/></names>
        <judging>
            <testset name="tests">
                <time-limit>1000</time-limit>
                <memory-limit>134217728</memory-limit>
                <input-path-pattern>tests/%02d</input-path-pattern>
                <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                <tests><test/><test/><test/></tests>
            </testset>
        </judging>
        <assets>
            <checker type="testlib">
                <source path="check.cpp" type="cpp.g++17"/>
            </checker>
        </assets>
    </problem>
    "#;
    let package = package_zip(&[
        ("problem.xml", xml.as_bytes()),
        ("tests/01", b"1\n"),
        ("tests/01.a", b"1\n"),
        ("tests/02", b"2\n"),
        ("tests/02.a", b"2\n"),
        ("tests/03", b"3\n"),
        ("tests/03.a", b"3\n"),
        ("check.cpp", b"// checker\n"),
        ("files/testlib.h", b"// testlib\n"),
    ]);

    let data_root = tempfile::tempdir().unwrap();
    let fixture = fixture(package, data_root.path()).await;
    let source = fixture
        .sources
        .create_source(44, AUTHOR.0, "nopoints")
        .await
        .unwrap();
    let task_id = fixture.dispatcher.dispatch(source.id, AUTHOR).unwrap();
    assert_eq!(
        wait_terminal(&fixture.dispatcher, task_id).await,
        TaskState::Success
    );

    let saved = fixture.judge.saved_problem("nopoints").unwrap();
    assert!(!saved.partial);
    assert!((saved.points - 1.0).abs() < f64::EPSILON);

    let manifest: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(data_root.path().join("nopoints").join("init.yml")).unwrap(),
    )
    .unwrap();
    let cases = manifest["test_cases"].as_array().unwrap();
    assert_eq!(cases.len(), 3);
    assert_eq!(cases[0]["points"], 0);
    assert_eq!(cases[1]["points"], 0);
    assert_eq!(cases[2]["points"], 1);
}

#[tokio::test]
async fn missing_tests_testset_fails_without_creating_anything() {
    let xml = r#"
    <problem revision="1" short-name="broken">
        <names><name language="english" value="Broken"/></names>
        <judging>
            <testset name="pretests">
                <input-path-pattern>tests/%02d</input-path-pattern>
                <answer-path-pattern>tests/%02d.a</answer-path-pattern>
                <tests><test points="1"/></tests>
            </testset>
        </judging>
    </problem>
    "#;
    let package = package_zip(&[
        ("problem.xml", xml.as_bytes()),
        ("tests/01", b"1\n"),
        ("tests/01.a", b"1\n"),
    ]);

    let data_root = tempfile::tempdir().unwrap();
    let fixture = fixture(package, data_root.path()).await;
    let source = fixture
        .sources
        .create_source(45, AUTHOR.0, "broken")
        .await
        .unwrap();
    let task_id = fixture.dispatcher.dispatch(source.id, AUTHOR).unwrap();

    let state = wait_terminal(&fixture.dispatcher, task_id).await;
    let TaskState::Failure { error } = state else {
        panic!("expected failure, got {state:?}");
    };
    assert!(error.contains("Testset \"tests\" is empty or missing"));

    // No judge problem, no data directory, no media
    assert!(fixture.judge.saved_problem("broken").is_none());
    assert!(!data_root.path().join("broken").exists());
    assert!(fixture.media.paths().is_empty());

    let imports = fixture.sources.list_imports(&source.id).await.unwrap();
    assert_eq!(imports[0].status, ImportStatus::Failed);
    assert!(imports[0].error.as_deref().unwrap().contains("Testset"));
    assert!(fixture
        .sources
        .get_source(&source.id)
        .await
        .unwrap()
        .unwrap()
        .problem_id
        .is_none());
}

#[tokio::test]
async fn duplicate_code_fails_before_any_download() {
    let data_root = tempfile::tempdir().unwrap();
    let fixture = fixture(checker_package(), data_root.path()).await;

    // Another problem already claims the code and this source never imported
    fixture.judge.seed_problem_code("aplusb");
    let source = fixture
        .sources
        .create_source(46, AUTHOR.0, "aplusb")
        .await
        .unwrap();
    let task_id = fixture.dispatcher.dispatch(source.id, AUTHOR).unwrap();

    let state = wait_terminal(&fixture.dispatcher, task_id).await;
    let TaskState::Failure { error } = state else {
        panic!("expected failure, got {state:?}");
    };
    assert!(error.contains("already exists"));
}

#[tokio::test]
async fn second_dispatch_for_a_busy_source_is_refused() {
    let data_root = tempfile::tempdir().unwrap();

    // Build services but never start the worker, so the first job stays queued
    let mut config = ApplicationConfig::from_env();
    config.judge.problem_data_root = data_root.path().to_path_buf();
    let services = Arc::new(ImportServices {
        polygon: PolygonClient::new(config.polygon.clone()),
        judge: Arc::new(MockJudgeClient::new()),
        media: Arc::new(MemoryMediaStore::new()),
        sources: Arc::new(MockSourceRepository::new()),
        pandoc: PandocConverter::unchecked("pandoc"),
        config,
    });
    let (dispatcher, _worker, _shutdown) = import_worker(services);

    let source_id = uuid::Uuid::new_v4();
    dispatcher.dispatch(source_id, AUTHOR).unwrap();
    assert_eq!(
        dispatcher.dispatch(source_id, AUTHOR).unwrap_err(),
        polyport_importer::DispatchError::AlreadyRunning
    );
}
