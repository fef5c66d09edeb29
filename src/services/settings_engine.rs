// TidyTabs Settings Engine
// Manages the synced preference tier (small UI settings) and the coordinator
// configuration. Both are stored as JSON files in the data directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::errors::PrefsError;
use crate::types::settings::{CoordinatorConfig, SyncedPrefs};

/// File name of the synced tier inside the data directory.
pub const SYNCED_FILE: &str = "synced.json";
/// File name of the coordinator configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Trait defining the synced settings interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<SyncedPrefs, PrefsError>;
    fn save(&self) -> Result<(), PrefsError>;
    fn get_prefs(&self) -> &SyncedPrefs;
    fn set_prefs(&mut self, prefs: SyncedPrefs) -> Result<(), PrefsError>;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), PrefsError>;
    fn reset(&mut self) -> Result<(), PrefsError>;
}

/// Synced settings, persisted as JSON when a path is configured.
pub struct SettingsEngine {
    path: Option<PathBuf>,
    prefs: SyncedPrefs,
}

impl SettingsEngine {
    /// Creates an engine backed by the JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            prefs: SyncedPrefs::default(),
        }
    }

    /// Creates an engine that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            prefs: SyncedPrefs::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from disk; a missing file yields defaults.
    fn load(&mut self) -> Result<SyncedPrefs, PrefsError> {
        if let Some(path) = &self.path {
            self.prefs = read_json(path)?;
        }
        Ok(self.prefs.clone())
    }

    fn save(&self) -> Result<(), PrefsError> {
        match &self.path {
            Some(path) => write_json(path, &self.prefs),
            None => Ok(()),
        }
    }

    fn get_prefs(&self) -> &SyncedPrefs {
        &self.prefs
    }

    fn set_prefs(&mut self, prefs: SyncedPrefs) -> Result<(), PrefsError> {
        self.prefs = prefs;
        self.save()
    }

    /// Updates one setting by its wire name (`alwaysOnPanel`, `hints`).
    ///
    /// The value is validated by deserializing the whole settings object
    /// again, then saved.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), PrefsError> {
        if key.is_empty() {
            return Err(PrefsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.prefs)
            .map_err(|e| PrefsError::Serialization(format!("Failed to serialize settings: {}", e)))?;
        match json_value.as_object_mut() {
            Some(map) if map.contains_key(key) => {
                map.insert(key.to_string(), value);
            }
            _ => return Err(PrefsError::InvalidKey(format!("Key '{}' not found in settings", key))),
        }

        self.prefs = serde_json::from_value(json_value)
            .map_err(|e| PrefsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e)))?;
        self.save()
    }

    fn reset(&mut self) -> Result<(), PrefsError> {
        self.prefs = SyncedPrefs::default();
        self.save()
    }
}

/// Loads the coordinator configuration; a missing file yields defaults.
pub fn load_config(path: &Path) -> Result<CoordinatorConfig, PrefsError> {
    read_json(path)
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, PrefsError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)
        .map_err(|e| PrefsError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| PrefsError::Serialization(format!("Failed to parse {}: {}", path.display(), e)))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PrefsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PrefsError::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PrefsError::Serialization(format!("Failed to serialize settings: {}", e)))?;
    fs::write(path, json)
        .map_err(|e| PrefsError::Io(format!("Failed to write {}: {}", path.display(), e)))
}
