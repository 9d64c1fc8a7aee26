//! What happens once a change has been classified and let through.
//!
//! Both handlers are total: every failure ends up as a notification and a log
//! line, never as an error returned to the watcher.

use std::{
    fs,
    path::Path,
    sync::{Arc, RwLock},
};

use crate::{
    error::EventError,
    modules::{is_no_game, ModuleFetcher},
    notifier::Notifier,
    state::AppState,
    submit::{ScoreRecord, ScoreSubmitter},
};

/// How a game-change event was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    NoGame,
    ModuleReady(String),
    DefaultDetection(String),
    Failed(String),
}

/// How a score-change event was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    Submitted,
    Rejected,
    Failed(String),
}

pub struct ChangeHandler {
    fetcher: ModuleFetcher,
    submitter: ScoreSubmitter,
    notifier: Arc<dyn Notifier>,
    state: Arc<RwLock<AppState>>,
}

impl ChangeHandler {
    pub fn new(
        fetcher: ModuleFetcher,
        submitter: ScoreSubmitter,
        notifier: Arc<dyn Notifier>,
        state: Arc<RwLock<AppState>>,
    ) -> ChangeHandler {
        ChangeHandler {
            fetcher,
            submitter,
            notifier,
            state,
        }
    }

    fn update_state(&self, update: impl FnOnce(&mut AppState)) {
        if let Ok(mut state) = self.state.write() {
            update(&mut state);
        }
    }

    pub fn on_game_change(&self, path: &Path) -> GameOutcome {
        tracing::info!("Current game file changed: {}", path.display());

        let game = match read_game_marker(path) {
            Ok(game) => game,
            Err(e) => {
                tracing::error!("Error processing current game file: {}", e);
                self.notifier
                    .notify("Error", &format!("Failed to process game file: {}", e));
                self.update_state(|state| state.set_error(Some(e.to_string())));
                return GameOutcome::Failed(e.to_string());
            }
        };

        if is_no_game(&game) {
            tracing::info!("No ROM loaded or invalid game name");
            self.notifier.notify("No Game", "No ROM currently loaded");
            self.update_state(|state| state.set_current_game(None));
            return GameOutcome::NoGame;
        }

        tracing::info!("New game detected: {}", game);
        self.update_state(|state| state.set_current_game(Some(game.clone())));
        self.notifier.notify(
            "Game Detected",
            &format!("Found: {}\nChecking for game module...", game),
        );

        if self.fetcher.fetch(&game) {
            self.notifier.notify(
                "Module Downloaded",
                &format!("Game module ready for {}", game),
            );
            GameOutcome::ModuleReady(game)
        } else {
            self.notifier.notify(
                "Using Default Detection",
                &format!("No specific module found for {}", game),
            );
            GameOutcome::DefaultDetection(game)
        }
    }

    pub fn on_score_change(&self, path: &Path) -> ScoreOutcome {
        tracing::info!("High score file changed: {}", path.display());

        let record = match read_score_record(path) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Error processing high score file: {}", e);
                self.notifier
                    .notify("Error", &format!("Failed to process high score: {}", e));
                self.update_state(|state| state.set_error(Some(e.to_string())));
                return ScoreOutcome::Failed(e.to_string());
            }
        };

        tracing::info!(
            game = %record.game_or_default(),
            score = %record.score_display(),
            initials = %record.initials_or_default(),
            timestamp = %record.timestamp_or_default(),
            "New high score detected"
        );

        let accepted = self.submitter.submit(&record);
        self.update_state(|state| {
            state.record_submission(
                record.game_or_default(),
                record.score_display(),
                accepted,
            )
        });

        if accepted {
            self.notifier.notify(
                "High Score Submitted!",
                &format!(
                    "{}: {} points",
                    record.game().as_deref().unwrap_or("Game"),
                    record.score_display()
                ),
            );
            ScoreOutcome::Submitted
        } else {
            self.notifier
                .notify("Submission Failed", "Could not submit high score to API");
            ScoreOutcome::Rejected
        }
    }
}

/// Reads the marker file and trims it.
pub fn read_game_marker(path: &Path) -> Result<String, EventError> {
    fs::read_to_string(path)
        .map(|text| text.trim().to_string())
        .map_err(|source| EventError::Read {
            path: path.to_path_buf(),
            source,
        })
}

pub fn read_score_record(path: &Path) -> Result<ScoreRecord, EventError> {
    let text = fs::read_to_string(path).map_err(|source| EventError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| EventError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
