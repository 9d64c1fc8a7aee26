//! Tray application: owns the watcher and the process lifetime.

use std::{
    error::Error,
    fs,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::{Duration, Instant},
};
use winit::{
    application::ApplicationHandler,
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};

use crate::{
    config::Settings,
    host_config::HostConfigRegistrar,
    modules::ModuleFetcher,
    notifier::{DesktopNotifier, Notifier},
    state::AppState,
    submit::ScoreSubmitter,
    tray::{Tray, TrayCommand},
    utils::open_in_file_manager,
    watcher::{ChangeHandler, ChangePipeline, FileWatcher},
};

/// How often the event loop wakes up to poll the tray and the shutdown flag.
const TICK: Duration = Duration::from_millis(100);

/// Wires the real collaborators into a pipeline for `settings`.
pub fn build_pipeline(
    settings: &Settings,
    notifier: Arc<dyn Notifier>,
    state: Arc<RwLock<AppState>>,
) -> ChangePipeline {
    let registrar = Arc::new(HostConfigRegistrar::new(settings.host_config_path()));
    let fetcher = ModuleFetcher::new(settings.games_dir(), &settings.modules_base_url)
        .with_registrar(registrar);
    let submitter = ScoreSubmitter::new(&settings.submit_url);

    ChangePipeline::new(ChangeHandler::new(fetcher, submitter, notifier, state))
}

/// Starts watching the Lua output directory, creating it first if needed.
pub fn start_watching(
    settings: &Settings,
    notifier: Arc<dyn Notifier>,
    state: Arc<RwLock<AppState>>,
) -> Result<FileWatcher, Box<dyn Error>> {
    let watch_dir = settings.watch_dir();
    fs::create_dir_all(&watch_dir)?;

    let pipeline = build_pipeline(settings, notifier, Arc::clone(&state));
    let watcher = FileWatcher::start(&watch_dir, pipeline)?;

    if let Ok(mut state) = state.write() {
        state.set_watching(true);
    }
    Ok(watcher)
}

pub struct App {
    settings: Settings,
    state: Arc<RwLock<AppState>>,
    notifier: Arc<dyn Notifier>,
    shutdown: Arc<AtomicBool>,
    watcher: Option<FileWatcher>,
    tray: Option<Tray>,
    error: Option<Box<dyn Error>>,
}

impl App {
    pub fn new(settings: Settings, notifier: Arc<dyn Notifier>, shutdown: Arc<AtomicBool>) -> App {
        App {
            settings,
            state: AppState::new(),
            notifier,
            shutdown,
            watcher: None,
            tray: None,
            error: None,
        }
    }

    fn start(&mut self) -> Result<(), Box<dyn Error>> {
        self.watcher = Some(start_watching(
            &self.settings,
            Arc::clone(&self.notifier),
            Arc::clone(&self.state),
        )?);
        self.tray = Some(Tray::new()?);

        self.notifier.notify(
            "BizHawk Tracker Started",
            &format!(
                "Watching for high scores...\nAPI: {}",
                self.settings.submit_url
            ),
        );
        tracing::info!("High score tracker is now running in the background");
        Ok(())
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        if let Ok(mut state) = self.state.write() {
            state.set_watching(false);
        }
        event_loop.exit();
    }

    fn show_status(&self) {
        let watched = self.settings.highscores_path().display().to_string();
        let report = match self.state.read() {
            Ok(state) => state.status_report(&watched, &self.settings.submit_url),
            Err(_) => format!("Watching: {}\nAPI: {}", watched, self.settings.submit_url),
        };
        self.notifier.notify("BizHawk Tracker Status", &report);
    }

    fn handle_command(&mut self, command: TrayCommand, event_loop: &ActiveEventLoop) {
        match command {
            TrayCommand::ShowStatus => self.show_status(),
            TrayCommand::OpenFolder => {
                let dir = self.settings.watch_dir();
                if let Err(e) = open_in_file_manager(&dir) {
                    tracing::warn!("Could not open folder {}: {}", dir.display(), e);
                }
            }
            TrayCommand::Quit => {
                tracing::info!("Shutting down BizHawk High Score Tracker");
                self.stop(event_loop);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        if matches!(cause, StartCause::Init) {
            if let Err(e) = self.start() {
                tracing::error!("Failed to start tracker: {}", e);
                self.error = Some(e);
                self.stop(event_loop);
                return;
            }
        }

        if self.shutdown.load(Ordering::SeqCst) {
            tracing::info!("Application stopped by user");
            self.stop(event_loop);
            return;
        }

        let command = self.tray.as_mut().and_then(|tray| {
            tray.update_status(&self.state);
            tray.poll_events()
        });
        if let Some(command) = command {
            self.handle_command(command, event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + TICK));
    }

    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, _event: WindowEvent) {}
}

/// Runs the tray until Quit or until `shutdown` is raised. The watcher is
/// always stopped before this returns.
pub fn run(settings: Settings, shutdown: Arc<AtomicBool>) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, Arc::new(DesktopNotifier), shutdown);

    let result = event_loop.run_app(&mut app);
    if let Some(mut watcher) = app.watcher.take() {
        watcher.stop();
    }
    result?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
