use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ureq::Agent;

use crate::{
    error::HttpError,
    utils::{http_agent, SUBMIT_TIMEOUT},
};

/// One high score as written by the emulator script to `highscores.json`.
///
/// The object is kept exactly as read and posted unchanged; the known keys
/// are only looked at for display.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ScoreRecord {
    fields: Map<String, Value>,
}

impl ScoreRecord {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Display text for `key`: strings as-is, other values in JSON form,
    /// `None` when absent or `null`.
    fn display(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn game(&self) -> Option<String> {
        self.display("game")
    }

    pub fn game_or_default(&self) -> String {
        self.game().unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn score_display(&self) -> String {
        self.display("score").unwrap_or_else(|| "0".to_string())
    }

    pub fn initials_or_default(&self) -> String {
        self.display("initials").unwrap_or_else(|| "N/A".to_string())
    }

    pub fn timestamp_or_default(&self) -> String {
        self.display("timestamp").unwrap_or_else(|| "Unknown".to_string())
    }
}

impl From<Map<String, Value>> for ScoreRecord {
    fn from(fields: Map<String, Value>) -> Self {
        ScoreRecord { fields }
    }
}

/// Posts score records to the leaderboard API. At most once per record.
pub struct ScoreSubmitter {
    url: String,
    agent: Agent,
}

impl ScoreSubmitter {
    pub fn new(url: &str) -> ScoreSubmitter {
        ScoreSubmitter {
            url: url.to_string(),
            agent: http_agent(SUBMIT_TIMEOUT),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns whether the endpoint accepted the record with a 2xx.
    pub fn submit(&self, record: &ScoreRecord) -> bool {
        match self.try_submit(record) {
            Ok(()) => {
                tracing::info!("Successfully submitted score to {}", self.url);
                true
            }
            Err(e) => {
                tracing::error!("Score submission to {} failed: {}", self.url, e);
                false
            }
        }
    }

    pub fn try_submit(&self, record: &ScoreRecord) -> Result<(), HttpError> {
        tracing::info!(
            game = %record.game_or_default(),
            score = %record.score_display(),
            initials = %record.initials_or_default(),
            timestamp = %record.timestamp_or_default(),
            "Submitting high score to {}",
            self.url
        );

        self.agent.post(&self.url).send_json(record)?;
        Ok(())
    }
}
