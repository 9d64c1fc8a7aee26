//! Per-game Lua modules, downloaded once from the modules host and kept in
//! `Lua/NES/games/`.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use ureq::Agent;

use crate::{
    error::FetchError,
    host_config::{host_script_path, PathRegistrar},
    utils::{download_text, http_agent, DOWNLOAD_TIMEOUT},
};

pub const MODULE_EXTENSION: &str = "lua";

/// True for the values the emulator script writes when no ROM is loaded.
pub fn is_no_game(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.eq_ignore_ascii_case("null") || name.eq_ignore_ascii_case("none")
}

/// Lowercases, turns spaces into underscores, deletes `.` and `-`, and drops
/// anything else that is not alphanumeric or `_`.
pub fn normalize_game_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| *c != '.' && *c != '-')
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// `<normalized>.lua`, or `None` when the name cannot produce a module file.
pub fn module_filename(name: &str) -> Option<String> {
    if is_no_game(name) {
        return None;
    }
    let normalized = normalize_game_name(name);
    if normalized.is_empty() {
        return None;
    }
    Some(format!("{normalized}.{MODULE_EXTENSION}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The module was already on disk; nothing was requested.
    AlreadyPresent(PathBuf),
    Downloaded(PathBuf),
}

impl FetchOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FetchOutcome::AlreadyPresent(path) | FetchOutcome::Downloaded(path) => path,
        }
    }
}

pub struct ModuleFetcher {
    games_dir: PathBuf,
    base_url: String,
    agent: Agent,
    registrar: Option<Arc<dyn PathRegistrar>>,
}

impl ModuleFetcher {
    pub fn new(games_dir: impl Into<PathBuf>, base_url: &str) -> ModuleFetcher {
        ModuleFetcher {
            games_dir: games_dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: http_agent(DOWNLOAD_TIMEOUT),
            registrar: None,
        }
    }

    /// Newly downloaded modules get registered through `registrar`.
    pub fn with_registrar(mut self, registrar: Arc<dyn PathRegistrar>) -> ModuleFetcher {
        self.registrar = Some(registrar);
        self
    }

    pub fn games_dir(&self) -> &Path {
        &self.games_dir
    }

    pub fn module_url(&self, filename: &str) -> String {
        format!("{}/{}", self.base_url, filename)
    }

    /// Makes sure the module for `game` is on disk. Returns `false` when there
    /// is no module for it, which callers treat as "use default detection".
    pub fn fetch(&self, game: &str) -> bool {
        match self.try_fetch(game) {
            Ok(FetchOutcome::AlreadyPresent(path)) => {
                tracing::info!("Module already exists: {}", path.display());
                true
            }
            Ok(FetchOutcome::Downloaded(path)) => {
                tracing::info!("Module ready: {}", path.display());
                true
            }
            Err(FetchError::InvalidGame(name)) => {
                tracing::warn!("Skipping download for invalid game name: '{}'", name);
                false
            }
            Err(e @ FetchError::Download { .. }) => {
                tracing::warn!("{}; game will use default detection logic", e);
                false
            }
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }

    pub fn try_fetch(&self, game: &str) -> Result<FetchOutcome, FetchError> {
        let filename =
            module_filename(game).ok_or_else(|| FetchError::InvalidGame(game.to_string()))?;

        fs::create_dir_all(&self.games_dir).map_err(|source| FetchError::CreateDir {
            path: self.games_dir.clone(),
            source,
        })?;

        let module_path = self.games_dir.join(&filename);
        if module_path.exists() {
            return Ok(FetchOutcome::AlreadyPresent(module_path));
        }

        let url = self.module_url(&filename);
        tracing::info!(url = %url, "Downloading game module {}", filename);

        let body = download_text(&self.agent, &url).map_err(|source| FetchError::Download {
            file: filename.clone(),
            source,
        })?;

        fs::write(&module_path, &body).map_err(|source| FetchError::Write {
            path: module_path.clone(),
            source,
        })?;
        tracing::info!(
            size = body.len(),
            "Downloaded {} to {}",
            filename,
            module_path.display()
        );

        if let Some(registrar) = &self.registrar {
            // the download stands even if the config cannot be updated
            registrar.register_path(&host_script_path(&module_path));
        }

        Ok(FetchOutcome::Downloaded(module_path))
    }
}
