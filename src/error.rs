//! Error types shared across the tracker.
//!
//! Leaf operations return these through their `try_*` functions; the watcher
//! handlers turn every one of them into a notification instead of propagating.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Failure of a single outbound HTTP request.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),
    /// Connection refused, DNS failure, timeout and friends.
    #[error("network error: {0}")]
    Network(String),
    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl From<ureq::Error> for HttpError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => HttpError::Status(code),
            e => HttpError::Network(e.to_string()),
        }
    }
}

/// Errors from downloading a per-game module.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid game name: '{0}'")]
    InvalidGame(String),
    #[error("failed to create games directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("module {file} not available: {source}")]
    Download { file: String, source: HttpError },
    #[error("failed to save module {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Errors from reading or rewriting BizHawk's `config.ini`.
#[derive(Error, Debug)]
pub enum HostConfigError {
    #[error("config.ini not found at {0}")]
    Missing(PathBuf),
    #[error("failed to access config.ini: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config.ini JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config.ini does not contain a JSON object")]
    NotAnObject,
}

/// Fatal failures of the first-run setup.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to download {what}: {source}")]
    Download { what: &'static str, source: HttpError },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to configure autoload: {0}")]
    HostConfig(#[from] HostConfigError),
}

/// Failures while reacting to a watched file change.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
