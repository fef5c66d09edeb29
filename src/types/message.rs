use serde::{Deserialize, Serialize};

use super::settings::SyncedPrefs;
use super::tab::{MoveIndex, Snapshot, TabId, WindowId};

/// A request sent by the UI surface, tagged by `task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "camelCase")]
pub enum Command {
    Init,
    #[serde(rename_all = "camelCase")]
    CreateTab { window_id: WindowId },
    CreateWindow,
    #[serde(rename_all = "camelCase")]
    RemoveTabs { tab_ids: Vec<TabId> },
    #[serde(rename_all = "camelCase")]
    RemoveWindows { window_ids: Vec<WindowId> },
    #[serde(rename_all = "camelCase")]
    ExtractTabs { tab_ids: Vec<TabId> },
    #[serde(rename_all = "camelCase")]
    PinTabs { tab_ids: Vec<TabId> },
    #[serde(rename_all = "camelCase")]
    SortTabs { tab_ids: Vec<TabId> },
    #[serde(rename_all = "camelCase")]
    FocusTab {
        tab_id: TabId,
        #[serde(default)]
        window_id: Option<WindowId>,
    },
    #[serde(rename_all = "camelCase")]
    FocusWindow { window_id: WindowId },
    #[serde(rename_all = "camelCase")]
    MoveTabs { tab_ids: Vec<TabId>, window_id: WindowId, index: MoveIndex },
    OpenUrl { url: String },
    #[serde(rename_all = "camelCase")]
    RemoveDuplicates { tab_ids: Vec<TabId> },
    StoreString { name: String, string: String },
    PopupInactive,
}

/// What a failed item was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Target {
    Tab(TabId),
    Window(WindowId),
}

/// One item of a batch that did not complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub target: Target,
    pub error: String,
}

/// Reply to a command: the refreshed tree plus whatever extras the command carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub windows: Snapshot,
    pub visited: Vec<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefs: Option<SyncedPrefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_of: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,
}

/// Unsolicited message pushed to an active UI surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "camelCase")]
pub enum PushEvent {
    NewTree { windows: Snapshot },
}
