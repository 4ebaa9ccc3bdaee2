//! Configuration management for Wordbadge.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.

use crate::error::{Result, WordbadgeError};
use crate::lifecycle::StoreOptions;
use crate::types::DictionaryEdition;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const APP_NAME: &str = "wordbadge";

/// Main configuration structure for Wordbadge.
///
/// ## Example Configuration File (wordbadge.toml)
///
/// ```toml
/// [general]
/// data_dir = "/var/lib/wordbadge"
/// log_level = "info"
///
/// [sources]
/// dir = "/usr/share/wordbadge/lists"
/// wordle = "wordle.txt"
/// common_bongo = "common_bongo.txt"
///
/// [sources.editions]
/// collins2019 = "csw19.txt"
///
/// [storage]
/// compress = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Word list resources
    pub sources: SourcesConfig,

    /// On-disk store settings
    pub storage: StorageConfig,

    /// User settings file location
    pub settings: SettingsConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Store location (None = default location)
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            data_dir: None,
            log_level: "info".to_string(),
        }
    }
}

/// Word list resource configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Directory holding the word lists (None = `<data_dir>/resources`)
    pub dir: Option<PathBuf>,

    /// Wordle list resource name
    pub wordle: String,

    /// Common words list resource name
    pub common_bongo: String,

    /// Per-edition scrabble resource overrides, keyed by edition id
    pub editions: BTreeMap<String, String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            dir: None,
            wordle: "wordle.txt".to_string(),
            common_bongo: "common_bongo.txt".to_string(),
            editions: BTreeMap::new(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// LZ4-compress the word table
    pub compress: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig { compress: true }
    }
}

/// User settings configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Settings file path (None = `<config_dir>/settings.json`)
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| WordbadgeError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
        })?;

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self).map_err(|e| WordbadgeError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME).ok_or_else(|| WordbadgeError::ConfigError {
            reason: "Could not determine home directory".to_string(),
        })
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("wordbadge.toml"))
    }

    /// Get the default data directory path.
    pub fn default_data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// Get the data directory (from config or default).
    pub fn data_dir(&self) -> Result<PathBuf> {
        match self.general.data_dir {
            Some(ref path) => Ok(path.clone()),
            None => Self::default_data_dir(),
        }
    }

    /// Get the word list directory (from config or `<data_dir>/resources`).
    pub fn resource_dir(&self) -> Result<PathBuf> {
        match self.sources.dir {
            Some(ref path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("resources")),
        }
    }

    /// Get the user settings file path (from config or default).
    pub fn settings_path(&self) -> Result<PathBuf> {
        match self.settings.path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.config_dir().join("settings.json")),
        }
    }

    /// Resource name backing the given scrabble edition.
    pub fn scrabble_resource(&self, edition: DictionaryEdition) -> String {
        self.sources
            .editions
            .get(edition.id())
            .cloned()
            .unwrap_or_else(|| edition.default_resource())
    }

    /// Options for constructing a [`StoreManager`](crate::StoreManager).
    ///
    /// Edition overrides with unknown ids are ignored with a warning.
    pub fn store_options(&self) -> Result<StoreOptions> {
        let mut options = StoreOptions::new(self.data_dir()?);
        options.wordle = self.sources.wordle.clone();
        options.common_bongo = self.sources.common_bongo.clone();
        options.compress = self.storage.compress;

        for (id, resource) in &self.sources.editions {
            match DictionaryEdition::from_id(id) {
                Some(edition) => {
                    options.editions.insert(edition, resource.clone());
                }
                None => warn!(edition = %id, "Ignoring resource override for unknown edition"),
            }
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.storage.compress);
        assert_eq!(config.sources.wordle, "wordle.txt");
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.general.data_dir = Some(temp_dir.path().join("data"));
        config.storage.compress = false;
        config
            .sources
            .editions
            .insert("collins2019".to_string(), "csw19.txt".to_string());

        config.save_to(&config_path).unwrap();
        let loaded = Config::load_from(&config_path).unwrap();

        assert_eq!(loaded.general.data_dir, Some(temp_dir.path().join("data")));
        assert!(!loaded.storage.compress);
        assert_eq!(
            loaded.scrabble_resource(DictionaryEdition::Collins2019),
            "csw19.txt"
        );
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert!(config.storage.compress); // Default value
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "[sources]\nwordle = \"answers.txt\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.sources.wordle, "answers.txt");
        assert_eq!(config.sources.common_bongo, "common_bongo.txt");
    }

    #[test]
    fn test_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        fs::write(&config_path, "[storage\ncompress = ").unwrap();

        let result = Config::load_from(&config_path);
        assert!(matches!(result, Err(WordbadgeError::ConfigError { .. })));
    }

    #[test]
    fn test_directories() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.general.data_dir = Some(temp_dir.path().to_path_buf());

        assert_eq!(config.data_dir().unwrap(), temp_dir.path());
        assert_eq!(
            config.resource_dir().unwrap(),
            temp_dir.path().join("resources")
        );

        config.sources.dir = Some(PathBuf::from("/lists"));
        assert_eq!(config.resource_dir().unwrap(), PathBuf::from("/lists"));

        config.settings.path = Some(PathBuf::from("/prefs.json"));
        assert_eq!(config.settings_path().unwrap(), PathBuf::from("/prefs.json"));
    }

    #[test]
    fn test_store_options() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.general.data_dir = Some(temp_dir.path().to_path_buf());
        config.sources.common_bongo = "common.txt".to_string();
        config
            .sources
            .editions
            .insert("nwl2020".to_string(), "twl.txt".to_string());
        config
            .sources
            .editions
            .insert("bogus".to_string(), "bogus.txt".to_string());

        let options = config.store_options().unwrap();
        assert_eq!(options.data_dir, temp_dir.path());
        assert_eq!(options.common_bongo, "common.txt");
        assert_eq!(options.scrabble_resource(DictionaryEdition::Nwl2020), "twl.txt");
        assert_eq!(
            options.scrabble_resource(DictionaryEdition::Nwl2023),
            "scrabble_nwl2023.txt"
        );
        assert_eq!(options.editions.len(), 1);
    }
}
