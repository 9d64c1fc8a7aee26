// File fixtures written into temporary BizHawk directories
// Allow dead code since fixtures are used by different test files compiled separately
#![allow(dead_code)]

use std::{fs, path::Path};

/// highscores.json as written by the emulator script
pub const PACMAN_HIGHSCORE: &str = r#"{
    "game": "Pac-Man",
    "score": 12300,
    "initials": "ABC",
    "timestamp": "2024-01-01T00:00:00Z"
}"#;

/// highscores.json carrying keys the tracker does not know about
pub const HIGHSCORE_WITH_EXTRAS: &str = r#"{
    "game": "Contra",
    "score": "99900",
    "initials": "KON",
    "timestamp": "2024-02-02T12:00:00Z",
    "level": 8,
    "player": 2
}"#;

/// highscores.json from a script that writes os.time() as the timestamp
pub const HIGHSCORE_NUMERIC_TIMESTAMP: &str = r#"{
    "game": "Pac-Man",
    "score": 12300,
    "initials": "ABC",
    "timestamp": 1704067200
}"#;

/// highscores.json with only a score
pub const HIGHSCORE_SCORE_ONLY: &str = r#"{"score": 500}"#;

/// highscores.json caught mid-write
pub const HIGHSCORE_TRUNCATED: &str = r#"{"game": "Pac-Man", "sco"#;

/// Minimal BizHawk config.ini with unrelated settings around the recent list
pub const BASE_CONFIG: &str = r#"{
  "RecentLua": {
    "recentlist": [],
    "MAX_RECENT_FILES": 8,
    "AutoLoad": false,
    "Frozen": false
  },
  "SoundVolume": 75,
  "PathEntries": {
    "Paths": [
      {
        "Type": "Base",
        "Path": ".",
        "System": "Global_NULL"
      }
    ]
  }
}"#;

/// config.ini whose recent list is already full
pub const FULL_RECENT_CONFIG: &str = r#"{
  "RecentLua": {
    "recentlist": [
      "one.lua",
      "two.lua",
      "three.lua",
      "four.lua",
      "five.lua",
      "six.lua",
      "seven.lua",
      "eight.lua"
    ],
    "MAX_RECENT_FILES": 8,
    "AutoLoad": false,
    "Frozen": false
  }
}"#;

/// config.ini that BizHawk would refuse to load
pub const MALFORMED_CONFIG: &str = "{ this is not json";

pub const AUTOLOAD_SCRIPT: &str = "-- detect_game.lua\nlocal name = gameinfo.getromname()\n";

pub const MODULE_STUB: &str = "-- stub";

pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
