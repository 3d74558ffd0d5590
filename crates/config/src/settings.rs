// User settings
// Loaded from ~/.config/rollcall/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Storage
    #[serde(rename = "store.path")]
    pub store_path: Option<PathBuf>,  // None = data dir default

    // Event
    #[serde(rename = "event.configPath")]
    pub event_config_path: Option<PathBuf>,

    // Logging
    #[serde(rename = "log.level")]
    pub log_level: String,

    // Output
    #[serde(rename = "output.json")]
    pub json_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: None,
            event_config_path: None,
            log_level: "warn".to_string(),
            json_output: false,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // Path to the SQLite database (null = platform data directory)
    "store.path": null,

    // Event config (.event.toml) used when --event is not given
    "event.configPath": null,

    // Log level: "error", "warn", "info", "debug", "trace"
    // RUST_LOG overrides this
    "log.level": "warn",

    // Print JSON instead of tables by default
    "output.json": false
}
"#;

/// Why a settings file could not be used.
#[derive(Debug)]
pub enum SettingsError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    CreateDefault { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "error reading {}: {}", path.display(), source)
            }
            Self::Parse { path, source } => {
                write!(f, "error parsing {}: {}", path.display(), source)
            }
            Self::CreateDefault { path, source } => {
                write!(f, "error writing default {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rollcall");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file is created with commented
    /// defaults. Callers decide how to fall back when this fails.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            Self::create_default_file(path)?;
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|source| SettingsError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&contents)
            .map_err(|source| SettingsError::Parse { path: path.to_path_buf(), source })
    }

    /// Parse settings JSON, ignoring whole-line `//` comments
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Database path: the configured one, or `<data dir>/rollcall/rollcall.db`
    pub fn effective_store_path(&self) -> PathBuf {
        match &self.store_path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rollcall")
                .join("rollcall.db"),
        }
    }

    fn create_default_file(path: &Path) -> Result<(), SettingsError> {
        let create = |source| SettingsError::CreateDefault { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(create)?;
        }
        fs::write(path, DEFAULT_CONFIG).map_err(create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_creates_commented_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rollcall").join("settings.json");

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        // The written template parses back to the defaults
        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded, Settings::default());
    }

    #[test]
    fn comments_are_stripped() {
        let settings = Settings::parse(
            r#"{
    // where the db lives
    "store.path": "/srv/rollcall/annual.db",
    "log.level": "debug"
}"#,
        )
        .unwrap();
        assert_eq!(settings.store_path, Some(PathBuf::from("/srv/rollcall/annual.db")));
        assert_eq!(settings.log_level, "debug");
        assert!(!settings.json_output);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ \"log.level\": ").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().starts_with(&format!("error parsing {}", path.display())));
    }

    #[test]
    fn unreadable_path_is_reported() {
        let dir = TempDir::new().unwrap();
        // A directory exists but cannot be read as a file
        let err = Settings::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn file_on_disk_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            event_config_path: Some(PathBuf::from("annual-day.event.toml")),
            json_output: true,
            ..Default::default()
        };
        fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn explicit_store_path_wins() {
        let settings = Settings { store_path: Some(PathBuf::from("x.db")), ..Default::default() };
        assert_eq!(settings.effective_store_path(), PathBuf::from("x.db"));
        assert!(Settings::default().effective_store_path().ends_with("rollcall/rollcall.db"));
    }
}
