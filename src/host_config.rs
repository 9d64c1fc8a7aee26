//! Edits to BizHawk's `config.ini`, which is a JSON document owned by the
//! emulator. Only the recent-Lua list and the two autoload flags are touched;
//! every other key is written back as it was read.

use serde_json::{json, Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{config::HOST_CONFIG_FILE, error::HostConfigError};

pub const RECENT_LUA_KEY: &str = "RecentLua";
pub const RECENT_LIST_KEY: &str = "recentlist";
pub const MAX_RECENT_FILES_KEY: &str = "MAX_RECENT_FILES";
pub const DEFAULT_MAX_RECENT_FILES: usize = 8;
pub const LUA_CONSOLE_KEY: &str = "BizHawk.Client.EmuHawk.LuaConsole";

/// Result of registering a script in the recent list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Added,
    AlreadyPresent,
}

/// Capability to record a script path in the host's autoload list.
pub trait PathRegistrar: Send + Sync {
    /// Returns whether the path is registered once the call completes.
    fn register_path(&self, path: &str) -> bool;
}

/// Converts a filesystem path to the form BizHawk stores in its recent list:
/// forward slashes, with the `Lua/NES` segment lowercased.
pub fn host_script_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace("/Lua/NES/", "/lua/nes/")
        .trim()
        .to_string()
}

/// An in-memory copy of `config.ini`.
#[derive(Debug, Clone)]
pub struct HostConfig {
    path: PathBuf,
    document: Map<String, Value>,
}

impl HostConfig {
    /// Reads and parses an existing config. A missing file is an error, never created here.
    pub fn load(path: &Path) -> Result<HostConfig, HostConfigError> {
        if !path.is_file() {
            return Err(HostConfigError::Missing(path.to_path_buf()));
        }

        let text = fs::read_to_string(path)?;
        HostConfig::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<HostConfig, HostConfigError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(document) => Ok(HostConfig {
                path: path.to_path_buf(),
                document,
            }),
            _ => Err(HostConfigError::NotAnObject),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Current recent-Lua entries, most recent first. Non-string entries are skipped.
    pub fn recent_scripts(&self) -> Vec<String> {
        self.document
            .get(RECENT_LUA_KEY)
            .and_then(|section| section.get(RECENT_LIST_KEY))
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|entry| entry.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains_script(&self, script: &str) -> bool {
        self.recent_scripts().iter().any(|entry| entry == script)
    }

    pub fn max_recent_files(&self) -> usize {
        self.document
            .get(RECENT_LUA_KEY)
            .and_then(|section| section.get(MAX_RECENT_FILES_KEY))
            .and_then(Value::as_u64)
            .map(|max| max as usize)
            .unwrap_or(DEFAULT_MAX_RECENT_FILES)
    }

    fn recent_lua_section(&mut self) -> &mut Map<String, Value> {
        let section = self
            .document
            .entry(RECENT_LUA_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !section.is_object() {
            *section = Value::Object(Map::new());
        }

        let Value::Object(section) = section else {
            unreachable!("RecentLua was just made an object");
        };
        section
            .entry(RECENT_LIST_KEY)
            .or_insert_with(|| json!([]));
        section
            .entry(MAX_RECENT_FILES_KEY)
            .or_insert_with(|| json!(DEFAULT_MAX_RECENT_FILES));
        section.entry("AutoLoad").or_insert_with(|| json!(false));
        section.entry("Frozen").or_insert_with(|| json!(false));
        section
    }

    /// Puts `script` at the head of the recent list and trims it to the
    /// configured maximum. An entry that is already present is left where it is.
    pub fn add_recent_script(&mut self, script: &str) -> RegisterOutcome {
        if self.contains_script(script) {
            return RegisterOutcome::AlreadyPresent;
        }

        let max = self.max_recent_files();
        let section = self.recent_lua_section();
        let list = section
            .entry(RECENT_LIST_KEY)
            .or_insert_with(|| json!([]));
        if !list.is_array() {
            *list = json!([]);
        }
        if let Value::Array(list) = list {
            list.insert(0, Value::String(script.to_string()));
            list.truncate(max);
        }

        RegisterOutcome::Added
    }

    /// Turns on autoload both for the recent list and for the Lua console tool,
    /// creating the console's settings block with BizHawk's defaults if needed.
    pub fn enable_autoload(&mut self) {
        self.recent_lua_section()
            .insert("AutoLoad".to_string(), Value::Bool(true));

        let tools = self
            .document
            .entry("CommonToolSettings")
            .or_insert_with(|| Value::Object(Map::new()));
        if !tools.is_object() {
            *tools = Value::Object(Map::new());
        }

        if let Value::Object(tools) = tools {
            match tools.get_mut(LUA_CONSOLE_KEY) {
                Some(Value::Object(console)) => {
                    console.insert("AutoLoad".to_string(), Value::Bool(true));
                }
                _ => {
                    tools.insert(
                        LUA_CONSOLE_KEY.to_string(),
                        json!({
                            "_wndx": 78,
                            "_wndy": 78,
                            "Width": 600,
                            "Height": 386,
                            "SaveWindowPosition": true,
                            "TopMost": false,
                            "FloatingWindow": true,
                            "AutoLoad": true
                        }),
                    );
                }
            }
        }
    }

    pub fn autoload_enabled(&self) -> bool {
        let recent = self
            .document
            .get(RECENT_LUA_KEY)
            .and_then(|section| section.get("AutoLoad"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let console = self
            .document
            .get("CommonToolSettings")
            .and_then(|tools| tools.get(LUA_CONSOLE_KEY))
            .and_then(|console| console.get("AutoLoad"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        recent && console
    }

    /// Sibling file the document is written to before replacing `config.ini`.
    pub fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| HOST_CONFIG_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Rewrites the whole document with two-space indentation. The new text
    /// goes to [`HostConfig::staging_path`] first and is renamed over the
    /// original, so a failed write leaves `config.ini` as it was.
    pub fn save(&self) -> Result<(), HostConfigError> {
        let mut text = serde_json::to_string_pretty(&self.document)?;
        text.push('\n');

        let staging = self.staging_path();
        fs::write(&staging, text)?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Registers `script` in the config at `config_path`. The file is rewritten
/// only when the list actually changes.
pub fn register_recent_script(
    config_path: &Path,
    script: &str,
) -> Result<RegisterOutcome, HostConfigError> {
    let mut config = HostConfig::load(config_path)?;
    let outcome = config.add_recent_script(script);

    match outcome {
        RegisterOutcome::AlreadyPresent => {
            tracing::debug!("{} already in RecentLua list", script);
        }
        RegisterOutcome::Added => {
            config.save()?;
            tracing::info!("Added {} to BizHawk RecentLua list", script);
        }
    }

    Ok(outcome)
}

/// [`PathRegistrar`] writing into a `config.ini` on disk.
#[derive(Debug, Clone)]
pub struct HostConfigRegistrar {
    config_path: PathBuf,
}

impl HostConfigRegistrar {
    pub fn new(config_path: impl Into<PathBuf>) -> HostConfigRegistrar {
        HostConfigRegistrar {
            config_path: config_path.into(),
        }
    }
}

impl PathRegistrar for HostConfigRegistrar {
    fn register_path(&self, path: &str) -> bool {
        match register_recent_script(&self.config_path, path) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Could not add {} to autoload list: {}", path, e);
                false
            }
        }
    }
}
