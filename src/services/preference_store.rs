//! Two-tier preference store.
//!
//! Small settings live in the synced tier ([`SettingsEngine`], JSON), larger
//! named strings in the local tier ([`Database`], SQLite). Both are plain
//! get/set by key. The install hook seeds the synced tier.

use std::path::Path;

use log::info;

use crate::database::Database;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait, SYNCED_FILE};
use crate::types::errors::PrefsError;
use crate::types::settings::{InstallReason, SyncedPrefs};

/// File name of the local tier inside the data directory.
pub const LOCAL_FILE: &str = "local.db";

/// Local key holding the UI's window color map.
pub const COLOR_OF_KEY: &str = "colorOf";

/// Local key holding the version that last ran.
pub const VERSION_KEY: &str = "installedVersion";

/// Oldest version whose synced settings are current; updates from anything
/// older reset them.
const PREFS_RESET_BEFORE: &str = "3.1";

pub struct PreferenceStore {
    synced: SettingsEngine,
    local: Database,
}

impl PreferenceStore {
    /// Opens both tiers inside `dir`, creating it if needed.
    pub fn open(dir: &Path) -> Result<Self, PrefsError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| PrefsError::Io(format!("Failed to create {}: {}", dir.display(), e)))?;
        let mut synced = SettingsEngine::new(dir.join(SYNCED_FILE));
        synced.load()?;
        let local = Database::open(dir.join(LOCAL_FILE))?;
        Ok(Self { synced, local })
    }

    /// A store that keeps everything in memory.
    pub fn in_memory() -> Result<Self, PrefsError> {
        Ok(Self {
            synced: SettingsEngine::in_memory(),
            local: Database::open_in_memory()?,
        })
    }

    pub fn synced(&self) -> SyncedPrefs {
        self.synced.get_prefs().clone()
    }

    pub fn set_synced(&mut self, key: &str, value: serde_json::Value) -> Result<(), PrefsError> {
        self.synced.set_value(key, value)
    }

    pub fn get_local(&self, key: &str) -> Result<Option<String>, PrefsError> {
        Ok(self.local.get_value(key)?)
    }

    pub fn set_local(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        Ok(self.local.set_value(key, value)?)
    }

    /// Seeds the synced tier after an install or update.
    ///
    /// A fresh install hides nothing and shows hints; updating from a version
    /// older than 3.1 keeps the browser panel visible, as it was before.
    pub fn on_installed(
        &mut self,
        reason: InstallReason,
        previous_version: Option<&str>,
    ) -> Result<(), PrefsError> {
        match reason {
            InstallReason::Install => {
                info!("First install, writing default preferences");
                self.synced.set_prefs(SyncedPrefs { always_on_panel: false, hints: true })
            }
            InstallReason::Update
                if previous_version.is_some_and(|v| is_older_than(v, PREFS_RESET_BEFORE)) =>
            {
                info!("Updated from {:?}, resetting preferences", previous_version);
                self.synced.set_prefs(SyncedPrefs { always_on_panel: true, hints: true })
            }
            InstallReason::Update => Ok(()),
        }
    }

    /// Compares `current` with the version recorded by the last start and
    /// runs the install hook when they differ.
    pub fn check_version(&mut self, current: &str) -> Result<Option<InstallReason>, PrefsError> {
        let recorded = self.get_local(VERSION_KEY)?;
        let reason = match recorded.as_deref() {
            None => Some(InstallReason::Install),
            Some(previous) if previous != current => Some(InstallReason::Update),
            Some(_) => None,
        };
        if let Some(reason) = reason {
            self.on_installed(reason, recorded.as_deref())?;
            self.set_local(VERSION_KEY, current)?;
        }
        Ok(reason)
    }
}

/// Compares dotted versions numerically, component by component.
///
/// Missing or non-numeric components count as 0, so `"3"` equals `"3.0"`.
pub fn is_older_than(version: &str, reference: &str) -> bool {
    let parse = |s: &str| -> Vec<u64> { s.split('.').map(|p| p.trim().parse().unwrap_or(0)).collect() };
    let version = parse(version);
    let reference = parse(reference);
    let len = version.len().max(reference.len());
    for i in 0..len {
        let a = version.get(i).copied().unwrap_or(0);
        let b = reference.get(i).copied().unwrap_or(0);
        if a != b {
            return a < b;
        }
    }
    false
}
