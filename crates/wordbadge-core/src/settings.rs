//! User settings persistence and dictionary edition selection.
//!
//! The settings screen of the host application writes a small JSON object
//! of string keys to string values. The store only ever reads one key from
//! it, [`EDITION_KEY`], but the file is shared, so unknown keys are kept
//! intact on write.

use crate::error::{Result, WordbadgeError};
use crate::types::DictionaryEdition;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Settings key holding the selected scrabble edition id
pub const EDITION_KEY: &str = "scrabble_edition";

/// Source of the currently selected dictionary edition.
///
/// Queried on every initialize/rebuild check, so implementations should
/// reflect changes made after construction.
pub trait EditionSelection: Send + Sync {
    fn selected_edition(&self) -> DictionaryEdition;
}

/// Application settings stored as a flat JSON object.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        SettingsFile {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| WordbadgeError::ConfigError {
                reason: format!("Failed to parse settings {}: {}", self.path.display(), e),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(values)
            .map_err(|e| WordbadgeError::serialization(e.to_string()))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Read one value.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    /// Set one value, keeping all other keys.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        debug!(path = %self.path.display(), key, value, "Saving setting");
        self.write_all(&values)
    }

    /// Remove one value. Returns whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut values = self.read_all()?;
        let existed = values.remove(key).is_some();
        if existed {
            self.write_all(&values)?;
        }
        Ok(existed)
    }

    /// Persist the edition selection.
    pub fn set_edition(&self, edition: DictionaryEdition) -> Result<()> {
        self.set(EDITION_KEY, edition.id())
    }
}

impl EditionSelection for SettingsFile {
    /// Absent, unknown or unreadable selections fall back to the default.
    fn selected_edition(&self) -> DictionaryEdition {
        let raw = match self.get(EDITION_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Cannot read edition setting, using default");
                None
            }
        };

        if let Some(ref id) = raw {
            if DictionaryEdition::from_id(id).is_none() {
                warn!(edition = %id, "Unknown dictionary edition, using default");
            }
        }
        DictionaryEdition::parse_or_default(raw.as_deref())
    }
}

/// An in-process edition selection.
#[derive(Debug, Default)]
pub struct FixedEdition {
    edition: RwLock<DictionaryEdition>,
}

impl FixedEdition {
    pub fn new(edition: DictionaryEdition) -> Self {
        FixedEdition {
            edition: RwLock::new(edition),
        }
    }

    /// Change the selection; takes effect on the next rebuild check.
    pub fn select(&self, edition: DictionaryEdition) {
        *self.edition.write() = edition;
    }
}

impl EditionSelection for FixedEdition {
    fn selected_edition(&self) -> DictionaryEdition {
        *self.edition.read()
    }
}
