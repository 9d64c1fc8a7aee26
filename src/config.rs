use configparser::ini::Ini;
use std::path::{Path, PathBuf};

/// Score submission endpoint used when `scorehawk.ini` does not override it.
pub const DEFAULT_SUBMIT_URL: &str = "http://localhost/api/submit_score.php";

/// Raw content host serving per-game Lua modules, one `<name>.lua` per game.
pub const DEFAULT_MODULES_BASE_URL: &str =
    "https://raw.githubusercontent.com/jeremystevens/modules/main";

/// Base `detect_game.lua` autoload script.
pub const DEFAULT_AUTOLOAD_SCRIPT_URL: &str = "https://pastebin.com/raw/ie96z6Ls";

/// Base BizHawk `config.ini`, downloaded only when the emulator has none yet.
pub const DEFAULT_BASE_CONFIG_URL: &str = "https://pastebin.com/raw/hFpK4WGx";

pub const SETTINGS_FILE_NAME: &str = "scorehawk.ini";

pub const CURRENT_GAME_FILE: &str = "current_game.txt";
pub const HIGHSCORES_FILE: &str = "highscores.json";
pub const AUTOLOAD_SCRIPT_FILE: &str = "detect_game.lua";
pub const GAME_MAPPINGS_FILE: &str = "game_mappings.json";
pub const HOST_CONFIG_FILE: &str = "config.ini";

/// Everything the tracker derives from its working directory, built once at
/// startup and handed to each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub root_dir: PathBuf,
    pub submit_url: String,
    pub modules_base_url: String,
    pub autoload_script_url: String,
    pub base_config_url: String,
}

impl Settings {
    /// Settings rooted at `root_dir` with every URL at its default.
    pub fn new(root_dir: impl Into<PathBuf>) -> Settings {
        Settings {
            root_dir: root_dir.into(),
            submit_url: DEFAULT_SUBMIT_URL.to_string(),
            modules_base_url: DEFAULT_MODULES_BASE_URL.to_string(),
            autoload_script_url: DEFAULT_AUTOLOAD_SCRIPT_URL.to_string(),
            base_config_url: DEFAULT_BASE_CONFIG_URL.to_string(),
        }
    }

    /// Directory BizHawk's Lua script writes into; the one being watched.
    pub fn watch_dir(&self) -> PathBuf {
        self.root_dir.join("Lua").join("NES")
    }

    pub fn games_dir(&self) -> PathBuf {
        self.watch_dir().join("games")
    }

    pub fn current_game_path(&self) -> PathBuf {
        self.watch_dir().join(CURRENT_GAME_FILE)
    }

    pub fn highscores_path(&self) -> PathBuf {
        self.watch_dir().join(HIGHSCORES_FILE)
    }

    /// Presence of this file marks setup as done.
    pub fn autoload_script_path(&self) -> PathBuf {
        self.watch_dir().join(AUTOLOAD_SCRIPT_FILE)
    }

    pub fn game_mappings_path(&self) -> PathBuf {
        self.watch_dir().join(GAME_MAPPINGS_FILE)
    }

    /// BizHawk's own configuration. Despite the extension it is JSON.
    pub fn host_config_path(&self) -> PathBuf {
        self.root_dir.join(HOST_CONFIG_FILE)
    }

    fn apply_ini(&mut self, config: &Ini) {
        let non_empty = |section: &str, key: &str| {
            config
                .get(section, key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        if let Some(url) = non_empty("API", "submitUrl") {
            self.submit_url = url;
        }
        if let Some(url) = non_empty("Modules", "baseUrl") {
            self.modules_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = non_empty("Setup", "autoloadScriptUrl") {
            self.autoload_script_url = url;
        }
        if let Some(url) = non_empty("Setup", "baseConfigUrl") {
            self.base_config_url = url;
        }
    }
}

fn config_dir_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scorehawk"))
}

/// Looks for `scorehawk.ini` next to the emulator first, then in the user's
/// config directory.
pub fn find_settings_file(root_dir: &Path) -> Option<PathBuf> {
    let mut locations = vec![root_dir.to_path_buf()];
    locations.extend(config_dir_path());

    let found = locations
        .iter()
        .map(|location| location.join(SETTINGS_FILE_NAME))
        .find(|file| file.is_file());

    if found.is_none() {
        tracing::debug!(
            "No {} found in {:?}, using defaults",
            SETTINGS_FILE_NAME,
            locations
        );
    }
    found
}

/// Loads settings for `root_dir`, applying `scorehawk.ini` overrides if one exists.
///
/// # Errors
///
/// Returns an error if a settings file exists but cannot be parsed.
pub fn load_settings(root_dir: &Path) -> Result<Settings, String> {
    let mut settings = Settings::new(root_dir);

    if let Some(path) = find_settings_file(root_dir) {
        let mut config = Ini::new_cs();
        config
            .load(&path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;
        settings.apply_ini(&config);
        tracing::info!("Loaded settings from {}", path.display());
    }

    Ok(settings)
}

/// Parses settings from INI text. Used for files and tests alike.
pub fn settings_from_ini_str(root_dir: &Path, ini: &str) -> Result<Settings, String> {
    let mut config = Ini::new_cs();
    config.read(ini.to_string())?;

    let mut settings = Settings::new(root_dir);
    settings.apply_ini(&config);
    Ok(settings)
}
