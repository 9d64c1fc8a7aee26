// Tests for change classification, debouncing and dispatch in src/watcher/

mod common;

use common::{
    fakes::{ManualClock, RecordingNotifier, RecordingRegistrar},
    fixtures,
};
use notify::{
    event::{CreateKind, DataChange, MetadataKind, ModifyKind},
    Event, EventKind,
};
use scorehawk::{
    app::build_pipeline,
    config::Settings,
    host_config::HostConfig,
    modules::ModuleFetcher,
    state::AppState,
    submit::ScoreSubmitter,
    watcher::{
        ChangeHandler, ChangePipeline, Debouncer, Dispatch, FileWatcher, GameOutcome,
        ScoreOutcome, DEBOUNCE_WINDOW,
    },
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    thread,
    time::{Duration, Instant},
};

struct Harness {
    pipeline: ChangePipeline<ManualClock>,
    clock: ManualClock,
    notifier: RecordingNotifier,
    registrar: RecordingRegistrar,
    state: Arc<RwLock<AppState>>,
    watch_dir: PathBuf,
    _dir: tempfile::TempDir,
}

fn harness(server_url: &str) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let watch_dir = dir.path().join("Lua").join("NES");
    fs::create_dir_all(&watch_dir).unwrap();

    let notifier = RecordingNotifier::new();
    let registrar = RecordingRegistrar::new();
    let state = AppState::new();
    let clock = ManualClock::new();

    let fetcher = ModuleFetcher::new(watch_dir.join("games"), &format!("{server_url}/modules"))
        .with_registrar(Arc::new(registrar.clone()));
    let submitter = ScoreSubmitter::new(&format!("{server_url}/api/submit_score.php"));
    let handler = ChangeHandler::new(
        fetcher,
        submitter,
        Arc::new(notifier.clone()),
        Arc::clone(&state),
    );
    let pipeline = ChangePipeline::with_debouncer(
        handler,
        Debouncer::with_clock(DEBOUNCE_WINDOW, clock.clone()),
    );

    Harness {
        pipeline,
        clock,
        notifier,
        registrar,
        state,
        watch_dir,
        _dir: dir,
    }
}

fn modify_event(path: &Path) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path.into())
}

// ============================================================================
// Filtering and Debounce Tests
// ============================================================================

#[test]
fn test_repeat_within_window_is_dropped() {
    let mut server = mockito::Server::new();
    let mut h = harness(&server.url());
    let marker = h.watch_dir.join("current_game.txt");
    fixtures::write(&marker, "null");
    let mock = server.mock("GET", mockito::Matcher::Any).expect(0).create();

    assert!(h.pipeline.handle_path(&marker).is_some());
    assert!(h.pipeline.handle_path(&marker).is_none());

    h.clock.advance(Duration::from_millis(999));
    assert!(h.pipeline.handle_path(&marker).is_none());

    // dropped events do not push the window forward
    h.clock.advance(Duration::from_millis(1));
    assert!(h.pipeline.handle_path(&marker).is_some());

    mock.assert();
    assert_eq!(h.notifier.titles(), vec!["No Game", "No Game"]);
}

#[test]
fn test_paths_are_debounced_independently() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/submit_score.php")
        .with_status(200)
        .create();
    let mut h = harness(&server.url());

    let marker = h.watch_dir.join("current_game.txt");
    let scores = h.watch_dir.join("highscores.json");
    fixtures::write(&marker, "null");
    fixtures::write(&scores, fixtures::PACMAN_HIGHSCORE);

    assert!(h.pipeline.handle_path(&marker).is_some());
    assert!(h.pipeline.handle_path(&scores).is_some());
}

#[test]
fn test_unrelated_files_and_directories_ignored() {
    let server = mockito::Server::new();
    let mut h = harness(&server.url());

    let other = h.watch_dir.join("detect_game.lua");
    fixtures::write(&other, fixtures::AUTOLOAD_SCRIPT);
    let dir_named_like_target = h.watch_dir.join("sub").join("highscores.json");
    fs::create_dir_all(&dir_named_like_target).unwrap();

    assert!(h.pipeline.handle_path(&other).is_none());
    assert!(h.pipeline.handle_path(&dir_named_like_target).is_none());
    assert!(h.notifier.sent().is_empty());
}

#[test]
fn test_metadata_only_events_ignored() {
    let server = mockito::Server::new();
    let mut h = harness(&server.url());
    let marker = h.watch_dir.join("current_game.txt");
    fixtures::write(&marker, "null");

    let metadata = Event::new(EventKind::Modify(ModifyKind::Metadata(
        MetadataKind::WriteTime,
    )))
    .add_path(marker.clone());
    assert!(h.pipeline.handle_event(&metadata).is_empty());

    let created = Event::new(EventKind::Create(CreateKind::File)).add_path(marker.clone());
    assert!(h.pipeline.handle_event(&created).is_empty());

    assert_eq!(
        h.pipeline.handle_event(&modify_event(&marker)),
        vec![Dispatch::Game(GameOutcome::NoGame)]
    );
}

#[test]
fn test_new_score_file_submitted_once_content_is_written() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/submit_score.php")
        .with_status(200)
        .expect(1)
        .create();
    let mut h = harness(&server.url());

    let scores = h.watch_dir.join("highscores.json");
    fixtures::write(&scores, "");
    let created = Event::new(EventKind::Create(CreateKind::File)).add_path(scores.clone());
    assert!(h.pipeline.handle_event(&created).is_empty());

    h.clock.advance(Duration::from_millis(100));
    fixtures::write(&scores, fixtures::PACMAN_HIGHSCORE);
    assert_eq!(
        h.pipeline.handle_event(&modify_event(&scores)),
        vec![Dispatch::Score(ScoreOutcome::Submitted)]
    );

    mock.assert();
    assert_eq!(h.notifier.titles(), vec!["High Score Submitted!"]);
}

// ============================================================================
// Game Change Tests
// ============================================================================

#[test]
fn test_no_game_marker_notifies_once_without_download() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", mockito::Matcher::Any).expect(0).create();
    let mut h = harness(&server.url());

    let marker = h.watch_dir.join("current_game.txt");
    fixtures::write(&marker, "null\n");

    let dispatched = h.pipeline.handle_event(&modify_event(&marker));

    assert_eq!(dispatched, vec![Dispatch::Game(GameOutcome::NoGame)]);
    assert_eq!(
        h.notifier.sent(),
        vec![("No Game".to_string(), "No ROM currently loaded".to_string())]
    );
    assert!(h.state.read().unwrap().current_game.is_none());
    mock.assert();
}

#[test]
fn test_new_game_downloads_and_registers_module() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/modules/donkey_kong.lua")
        .with_status(200)
        .with_body(fixtures::MODULE_STUB)
        .expect(1)
        .create();
    let mut h = harness(&server.url());

    let marker = h.watch_dir.join("current_game.txt");
    fixtures::write(&marker, "Donkey Kong");

    let dispatched = h.pipeline.handle_path(&marker);

    mock.assert();
    assert_eq!(
        dispatched,
        Some(Dispatch::Game(GameOutcome::ModuleReady(
            "Donkey Kong".to_string()
        )))
    );
    assert_eq!(
        fs::read_to_string(h.watch_dir.join("games").join("donkey_kong.lua")).unwrap(),
        fixtures::MODULE_STUB
    );
    assert_eq!(h.registrar.paths().len(), 1);
    assert_eq!(h.notifier.titles(), vec!["Game Detected", "Module Downloaded"]);
    assert_eq!(
        h.notifier.sent()[0].1,
        "Found: Donkey Kong\nChecking for game module..."
    );
    assert_eq!(
        h.state.read().unwrap().current_game.as_deref(),
        Some("Donkey Kong")
    );
}

#[test]
fn test_missing_module_falls_back_to_default_detection() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/modules/contra.lua")
        .with_status(404)
        .create();
    let mut h = harness(&server.url());

    let marker = h.watch_dir.join("current_game.txt");
    fixtures::write(&marker, "Contra");

    assert_eq!(
        h.pipeline.handle_path(&marker),
        Some(Dispatch::Game(GameOutcome::DefaultDetection(
            "Contra".to_string()
        )))
    );
    assert_eq!(
        h.notifier.titles(),
        vec!["Game Detected", "Using Default Detection"]
    );
    assert!(h.registrar.paths().is_empty());
}

#[test]
fn test_unreadable_marker_reports_error() {
    let server = mockito::Server::new();
    let h = harness(&server.url());

    // classify and debounce are bypassed; the handler itself must cope
    let fetcher = ModuleFetcher::new(h.watch_dir.join("games"), &server.url());
    let handler = ChangeHandler::new(
        fetcher,
        ScoreSubmitter::new(&server.url()),
        Arc::new(h.notifier.clone()),
        Arc::clone(&h.state),
    );

    let outcome = handler.on_game_change(&h.watch_dir.join("current_game.txt"));

    assert!(matches!(outcome, GameOutcome::Failed(_)));
    assert_eq!(h.notifier.titles(), vec!["Error"]);
    assert!(h.notifier.sent()[0]
        .1
        .starts_with("Failed to process game file:"));
    assert!(h.state.read().unwrap().last_error.is_some());
}

// ============================================================================
// Score Change Tests
// ============================================================================

#[test]
fn test_score_submitted() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/submit_score.php")
        .match_body(mockito::Matcher::PartialJson(
            serde_json::json!({"game": "Pac-Man", "score": 12300}),
        ))
        .with_status(200)
        .expect(1)
        .create();
    let mut h = harness(&server.url());

    let scores = h.watch_dir.join("highscores.json");
    fixtures::write(&scores, fixtures::PACMAN_HIGHSCORE);

    assert_eq!(
        h.pipeline.handle_path(&scores),
        Some(Dispatch::Score(ScoreOutcome::Submitted))
    );
    mock.assert();
    assert_eq!(
        h.notifier.sent(),
        vec![(
            "High Score Submitted!".to_string(),
            "Pac-Man: 12300 points".to_string()
        )]
    );

    let state = h.state.read().unwrap();
    let submission = state.last_submission.as_ref().unwrap();
    assert!(submission.accepted);
    assert_eq!(submission.game, "Pac-Man");
    assert_eq!(submission.score, "12300");
}

#[test]
fn test_score_rejected_is_reported_once() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/submit_score.php")
        .with_status(500)
        .expect(1)
        .create();
    let mut h = harness(&server.url());

    let scores = h.watch_dir.join("highscores.json");
    fixtures::write(&scores, fixtures::PACMAN_HIGHSCORE);

    assert_eq!(
        h.pipeline.handle_path(&scores),
        Some(Dispatch::Score(ScoreOutcome::Rejected))
    );
    mock.assert();
    assert_eq!(
        h.notifier.sent(),
        vec![(
            "Submission Failed".to_string(),
            "Could not submit high score to API".to_string()
        )]
    );
    assert!(!h.state.read().unwrap().last_submission.as_ref().unwrap().accepted);
}

#[test]
fn test_partial_score_file_is_not_submitted() {
    let mut server = mockito::Server::new();
    let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create();
    let mut h = harness(&server.url());

    let scores = h.watch_dir.join("highscores.json");
    fixtures::write(&scores, fixtures::HIGHSCORE_TRUNCATED);

    let dispatched = h.pipeline.handle_path(&scores);

    assert!(matches!(
        dispatched,
        Some(Dispatch::Score(ScoreOutcome::Failed(_)))
    ));
    mock.assert();
    assert_eq!(h.notifier.titles(), vec!["Error"]);
    assert!(h.notifier.sent()[0]
        .1
        .starts_with("Failed to process high score:"));
}

#[test]
fn test_score_without_game_uses_placeholder() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/submit_score.php")
        .with_status(200)
        .create();
    let mut h = harness(&server.url());

    let scores = h.watch_dir.join("highscores.json");
    fixtures::write(&scores, fixtures::HIGHSCORE_SCORE_ONLY);
    h.pipeline.handle_path(&scores);

    assert_eq!(h.notifier.sent()[0].1, "Game: 500 points");
}

// ============================================================================
// Wiring Tests
// ============================================================================

#[test]
fn test_build_pipeline_registers_in_host_config() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/donkey_kong.lua")
        .with_status(200)
        .with_body(fixtures::MODULE_STUB)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::new(dir.path());
    settings.modules_base_url = server.url();
    settings.submit_url = format!("{}/submit", server.url());
    fixtures::write(&settings.host_config_path(), fixtures::BASE_CONFIG);
    fixtures::write(&settings.current_game_path(), "Donkey Kong");

    let notifier = RecordingNotifier::new();
    let mut pipeline = build_pipeline(&settings, Arc::new(notifier.clone()), AppState::new());
    pipeline.handle_path(&settings.current_game_path());

    assert!(settings.games_dir().join("donkey_kong.lua").exists());
    let scripts = HostConfig::load(&settings.host_config_path())
        .unwrap()
        .recent_scripts();
    assert_eq!(scripts.len(), 1);
    assert!(scripts[0].ends_with("/lua/nes/games/donkey_kong.lua"));
}

#[test]
fn test_file_watcher_dispatches_and_stops() {
    let server = mockito::Server::new();
    let h = harness(&server.url());
    let notifier = h.notifier.clone();
    let marker = h.watch_dir.join("current_game.txt");

    let pipeline = ChangePipeline::new(build_handler(&h, &server.url()));
    let mut watcher = FileWatcher::start(&h.watch_dir, pipeline).unwrap();
    assert!(watcher.is_running());
    assert_eq!(watcher.dir(), h.watch_dir.as_path());

    fs::write(&marker, "null").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while notifier.sent().is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(notifier.titles().first().map(String::as_str), Some("No Game"));

    watcher.stop();
    assert!(!watcher.is_running());

    notifier.clear();
    thread::sleep(Duration::from_millis(1100));
    fs::write(&marker, "Contra").unwrap();
    thread::sleep(Duration::from_millis(300));
    assert!(notifier.sent().is_empty());
}

#[test]
fn test_file_watcher_waits_for_content_of_new_file() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/submit")
        .with_status(200)
        .expect(1)
        .create();
    let h = harness(&server.url());
    let notifier = h.notifier.clone();
    let scores = h.watch_dir.join("highscores.json");

    let handler = ChangeHandler::new(
        ModuleFetcher::new(h.watch_dir.join("games"), &server.url()),
        ScoreSubmitter::new(&format!("{}/submit", server.url())),
        Arc::new(h.notifier.clone()),
        Arc::clone(&h.state),
    );
    let mut watcher = FileWatcher::start(&h.watch_dir, ChangePipeline::new(handler)).unwrap();

    let mut file = fs::File::create(&scores).unwrap();
    thread::sleep(Duration::from_millis(100));
    file.write_all(fixtures::PACMAN_HIGHSCORE.as_bytes()).unwrap();
    file.sync_all().unwrap();
    drop(file);

    let deadline = Instant::now() + Duration::from_secs(5);
    while notifier.sent().is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
    thread::sleep(Duration::from_millis(200));
    watcher.stop();

    mock.assert();
    assert_eq!(notifier.titles(), vec!["High Score Submitted!"]);
}

fn build_handler(h: &Harness, server_url: &str) -> ChangeHandler {
    ChangeHandler::new(
        ModuleFetcher::new(h.watch_dir.join("games"), server_url),
        ScoreSubmitter::new(server_url),
        Arc::new(h.notifier.clone()),
        Arc::clone(&h.state),
    )
}
