//! Unit tests for the synced settings tier through its public trait interface:
//! default loading, value persistence and reset behavior.

use tempfile::TempDir;

use tidytabs::services::settings_engine::{SettingsEngine, SettingsEngineTrait, SYNCED_FILE};
use tidytabs::types::settings::SyncedPrefs;

/// The caller holds the `TempDir` handle for the duration of the test.
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    SettingsEngine::new(dir.path().join(SYNCED_FILE))
}

#[test]
fn test_load_defaults_when_no_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let prefs = engine.load().unwrap();

    assert_eq!(prefs, SyncedPrefs::default());
    assert!(!dir.path().join(SYNCED_FILE).exists(), "loading must not create the file");
}

#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine.set_value("hints", serde_json::Value::Bool(false)).unwrap();
    }

    let mut engine = engine_in_temp(&dir);
    let prefs = engine.load().unwrap();
    assert!(!prefs.hints);
    assert!(!prefs.always_on_panel);
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine
        .set_prefs(SyncedPrefs { always_on_panel: true, hints: false })
        .unwrap();

    engine.reset().unwrap();

    assert_eq!(engine.get_prefs(), &SyncedPrefs::default());
    let mut reloaded = engine_in_temp(&dir);
    assert_eq!(reloaded.load().unwrap(), SyncedPrefs::default());
}

#[test]
fn test_file_uses_wire_names() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.set_value("alwaysOnPanel", serde_json::json!(true)).unwrap();

    let raw = std::fs::read_to_string(dir.path().join(SYNCED_FILE)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value, serde_json::json!({"alwaysOnPanel": true, "hints": true}));
}

#[test]
fn test_empty_key_is_rejected() {
    let mut engine = SettingsEngine::in_memory();
    assert!(engine.set_value("", serde_json::json!(true)).is_err());
    assert!(engine.path().is_none());
}
