use serde::{Deserialize, Serialize};

/// Small settings kept in the synced preference tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncedPrefs {
    /// Keep the browser's own tab panel visible next to ours.
    pub always_on_panel: bool,
    /// Show keyboard hints in the UI.
    pub hints: bool,
}

impl Default for SyncedPrefs {
    fn default() -> Self {
        Self {
            always_on_panel: false,
            hints: true,
        }
    }
}

/// Key used when sorting a tab selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Url,
    /// URL followed by title, so equal URLs order by title.
    UrlTitle,
}

/// Tunables of the background coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CoordinatorConfig {
    /// Capacity of the visited-tab history.
    pub history_capacity: usize,
    /// Quiet interval before a tree change is rebroadcast, in milliseconds.
    pub debounce_ms: u64,
    pub sort_key: SortKey,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1024,
            debounce_ms: 1,
            sort_key: SortKey::Url,
        }
    }
}

/// Why the install hook ran.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InstallReason {
    Install,
    Update,
}
