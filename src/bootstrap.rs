//! First-run setup of a BizHawk directory.
//!
//! Runs only while `Lua/NES/detect_game.lua` is missing. Each step is
//! idempotent, so an interrupted setup can simply be run again.

use serde_json::json;
use std::{fs, path::Path};
use ureq::Agent;

use crate::{
    config::Settings,
    error::{HostConfigError, SetupError},
    host_config::{host_script_path, HostConfig, RegisterOutcome},
    utils::{download_text, http_agent, DOWNLOAD_TIMEOUT},
};

/// Files and directories that sit next to `EmuHawk.exe` in a BizHawk install.
pub const BIZHAWK_INDICATORS: [&str; 4] = ["EmuHawk.exe", "dll", "Firmware", "Tools"];

pub fn needs_setup(settings: &Settings) -> bool {
    !settings.autoload_script_path().exists()
}

/// Names of the BizHawk indicators present in `root_dir`.
pub fn find_bizhawk_indicators(root_dir: &Path) -> Vec<&'static str> {
    BIZHAWK_INDICATORS
        .iter()
        .copied()
        .filter(|indicator| root_dir.join(indicator).exists())
        .collect()
}

/// Warns when `root_dir` does not look like a BizHawk install. Never fatal.
pub fn verify_bizhawk_directory(root_dir: &Path) -> bool {
    let found = find_bizhawk_indicators(root_dir);
    if found.is_empty() {
        tracing::warn!(
            "{} doesn't appear to be a BizHawk directory (expected EmuHawk.exe, dll/, Firmware/, ...)",
            root_dir.display()
        );
        false
    } else {
        tracing::info!("BizHawk directory detected (found: {})", found.join(", "));
        true
    }
}

pub fn ensure_directories(settings: &Settings) -> Result<(), SetupError> {
    for dir in [settings.watch_dir(), settings.games_dir()] {
        fs::create_dir_all(&dir).map_err(|source| SetupError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        tracing::debug!("Ensured directory exists: {}", dir.display());
    }
    Ok(())
}

pub fn download_autoload_script(settings: &Settings, agent: &Agent) -> Result<(), SetupError> {
    let script_path = settings.autoload_script_path();
    if script_path.exists() {
        tracing::info!("detect_game.lua already exists at {}", script_path.display());
        return Ok(());
    }

    tracing::info!(url = %settings.autoload_script_url, "Downloading detect_game.lua");
    let script = download_text(agent, &settings.autoload_script_url).map_err(|source| {
        SetupError::Download {
            what: "detect_game.lua",
            source,
        }
    })?;

    fs::write(&script_path, &script).map_err(|source| SetupError::Write {
        path: script_path.clone(),
        source,
    })?;
    tracing::info!(
        size = script.len(),
        "Downloaded detect_game.lua to {}",
        script_path.display()
    );
    Ok(())
}

/// Makes BizHawk autoload `detect_game.lua`.
///
/// A missing `config.ini` is replaced by the base copy; if that download fails,
/// or the fresh copy does not parse, setup fails. An existing `config.ini`
/// that does not parse is left alone with a warning.
pub fn configure_autoload(settings: &Settings, agent: &Agent) -> Result<(), SetupError> {
    let config_path = settings.host_config_path();

    let freshly_downloaded = !config_path.exists();
    if freshly_downloaded {
        tracing::info!("config.ini not found, downloading base configuration");
        let base = download_text(agent, &settings.base_config_url).map_err(|source| {
            SetupError::Download {
                what: "base config.ini",
                source,
            }
        })?;
        fs::write(&config_path, base).map_err(|source| SetupError::Write {
            path: config_path.clone(),
            source,
        })?;
        tracing::info!("Downloaded base config.ini to {}", config_path.display());
    }

    let mut config = match HostConfig::load(&config_path) {
        Ok(config) => config,
        Err(e @ (HostConfigError::Parse(_) | HostConfigError::NotAnObject))
            if !freshly_downloaded =>
        {
            tracing::warn!(
                "{}; add detect_game.lua manually via Tools -> Lua Console -> Settings -> Autoload Script",
                e
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let script = host_script_path(&settings.autoload_script_path());
    if config.add_recent_script(&script) == RegisterOutcome::AlreadyPresent {
        tracing::info!("detect_game.lua already in RecentLua list");
    }
    config.enable_autoload();
    config.save()?;

    tracing::info!(
        config = %config_path.display(),
        script = %script,
        "Updated BizHawk config.ini to autoload detect_game.lua"
    );
    Ok(())
}

/// Writes the sample RAM address mappings unless the file already exists.
pub fn create_game_mappings(settings: &Settings) -> Result<(), SetupError> {
    let mappings_path = settings.game_mappings_path();
    if mappings_path.exists() {
        tracing::info!("game_mappings.json already exists at {}", mappings_path.display());
        return Ok(());
    }

    let mappings = json!({
        "games": {
            "Super Mario Bros.": {
                "system": "NES",
                "ram_mappings": {
                    "score": "0x07DD",
                    "lives": "0x075A",
                    "coins": "0x075E",
                    "world": "0x075F",
                    "level": "0x0760"
                }
            },
            "Donkey Kong": {
                "system": "NES",
                "ram_mappings": {
                    "score": "0x6000",
                    "lives": "0x6005"
                }
            },
            "Pac-Man": {
                "system": "NES",
                "ram_mappings": {
                    "score": "0x0043",
                    "lives": "0x0056"
                }
            }
        }
    });

    let write_error = |source| SetupError::Write {
        path: mappings_path.clone(),
        source,
    };
    let text = serde_json::to_string_pretty(&mappings)
        .map_err(|e| write_error(std::io::Error::other(e)))?;
    fs::write(&mappings_path, text).map_err(write_error)?;

    tracing::info!("Created game_mappings.json at {}", mappings_path.display());
    Ok(())
}

/// Runs every setup step in order, stopping at the first hard failure.
pub fn run_initial_setup(settings: &Settings) -> Result<(), SetupError> {
    tracing::info!("Running initial setup in {}", settings.root_dir.display());

    verify_bizhawk_directory(&settings.root_dir);
    ensure_directories(settings)?;

    let agent = http_agent(DOWNLOAD_TIMEOUT);
    download_autoload_script(settings, &agent)?;
    configure_autoload(settings, &agent)?;
    create_game_mappings(settings)?;

    tracing::info!("Initial setup completed successfully");
    Ok(())
}

/// Console summary shown after a successful setup.
pub fn setup_summary(settings: &Settings) -> String {
    format!(
        "Setup Summary:\n  \
         - detect_game.lua: {}\n  \
         - game_mappings.json: {}\n  \
         - games directory: {}\n  \
         - BizHawk config.ini: {}\n  \
         - API endpoint: {}\n  \
         - Game modules: {}\n\n\
         Next steps:\n  \
         1. Start BizHawk (EmuHawk.exe) and load a NES ROM\n  \
         2. detect_game.lua loads automatically from the Lua Console\n  \
         3. Game modules are downloaded as games are detected",
        settings.autoload_script_path().display(),
        settings.game_mappings_path().display(),
        settings.games_dir().display(),
        settings.host_config_path().display(),
        settings.submit_url,
        settings.modules_base_url,
    )
}
