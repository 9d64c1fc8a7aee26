use chrono::{DateTime, Local};
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct AppState {
    pub watching: bool,
    pub current_game: Option<String>,
    pub last_submission: Option<SubmissionInfo>,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct SubmissionInfo {
    pub game: String,
    pub score: String,
    pub accepted: bool,
    pub at: DateTime<Local>,
}

impl AppState {
    pub fn new() -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn set_watching(&mut self, watching: bool) {
        self.watching = watching;
    }

    pub fn set_current_game(&mut self, game: Option<String>) {
        self.current_game = game;
    }

    pub fn record_submission(&mut self, game: String, score: String, accepted: bool) {
        self.last_submission = Some(SubmissionInfo {
            game,
            score,
            accepted,
            at: Local::now(),
        });
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.last_error = error;
    }

    /// One-line summary for the tray menu and tooltip.
    pub fn status_text(&self) -> String {
        if !self.watching {
            return "Starting...".to_string();
        }

        match &self.current_game {
            Some(game) => format!("Playing {}", game),
            None => "No game loaded".to_string(),
        }
    }

    /// Multi-line report shown by the tray's Status action.
    pub fn status_report(&self, watched_file: &str, api_url: &str) -> String {
        let mut lines = vec![
            format!("Watching: {}", watched_file),
            format!("API: {}", api_url),
        ];

        if let Some(game) = &self.current_game {
            lines.push(format!("Game: {}", game));
        }

        if let Some(submission) = &self.last_submission {
            lines.push(format!(
                "Last score: {} {} ({}, {})",
                submission.game,
                submission.score,
                if submission.accepted {
                    "submitted"
                } else {
                    "failed"
                },
                submission.at.format("%H:%M")
            ));
        }

        if let Some(error) = &self.last_error {
            lines.push(format!("Last error: {}", error));
        }

        lines.join("\n")
    }
}
