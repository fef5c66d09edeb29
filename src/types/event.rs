use serde::{Deserialize, Serialize};

use super::tab::{TabId, WindowId};

/// Unsolicited change notifications emitted by the tab/window platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlatformEvent {
    #[serde(rename_all = "camelCase")]
    TabCreated { tab_id: TabId, window_id: WindowId },
    #[serde(rename_all = "camelCase")]
    TabMoved { tab_id: TabId, window_id: WindowId, from_index: usize, to_index: usize },
    #[serde(rename_all = "camelCase")]
    TabDetached { tab_id: TabId, old_window_id: WindowId },
    #[serde(rename_all = "camelCase")]
    TabAttached { tab_id: TabId, new_window_id: WindowId },
    /// `window_closing` is set when the removal cascades into closing the window.
    #[serde(rename_all = "camelCase")]
    TabRemoved { tab_id: TabId, window_id: WindowId, window_closing: bool },
    /// `pinned` is only present when the pin state changed.
    #[serde(rename_all = "camelCase")]
    TabUpdated { tab_id: TabId, pinned: Option<bool> },
    #[serde(rename_all = "camelCase")]
    TabActivated { tab_id: TabId, window_id: WindowId },
    #[serde(rename_all = "camelCase")]
    WindowCreated { window_id: WindowId },
    #[serde(rename_all = "camelCase")]
    WindowRemoved { window_id: WindowId },
    /// `None` when focus left every browser window.
    #[serde(rename_all = "camelCase")]
    WindowFocusChanged { window_id: Option<WindowId> },
}

impl PlatformEvent {
    /// Whether the event changes what the UI tree shows and should trigger a rebroadcast.
    pub fn changes_tree(&self) -> bool {
        match self {
            PlatformEvent::TabCreated { .. }
            | PlatformEvent::TabMoved { .. }
            | PlatformEvent::TabDetached { .. }
            | PlatformEvent::TabRemoved { .. } => true,
            PlatformEvent::TabUpdated { pinned, .. } => pinned.is_some(),
            _ => false,
        }
    }
}
