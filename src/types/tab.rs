use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Platform-assigned tab identifier.
pub type TabId = i64;

/// Platform-assigned window identifier.
pub type WindowId = i64;

/// Tab order of every window, keyed by window id.
pub type OrderByWindow = BTreeMap<WindowId, Vec<TabId>>;

/// Represents a browser tab as reported by the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    pub index: usize,
    pub url: String,
    pub title: String,
    pub pinned: bool,
    pub active: bool,
}

/// Kind of a top-level browser window. Only `Normal` windows are shown to the UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum WindowKind {
    #[default]
    Normal,
    Popup,
    Panel,
    Devtools,
}

/// A browser window with its tabs in strip order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: WindowId,
    pub focused: bool,
    #[serde(rename = "type")]
    pub kind: WindowKind,
    pub tabs: Vec<Tab>,
}

/// Point-in-time projection of every normal window and its tabs.
///
/// Snapshots are rebuilt from the platform and replaced wholesale; nothing
/// ever edits one in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Snapshot {
    windows: Vec<Window>,
}

impl Snapshot {
    pub fn new(windows: Vec<Window>) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window(&self, window_id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    pub fn tab(&self, tab_id: TabId) -> Option<&Tab> {
        self.windows
            .iter()
            .flat_map(|w| w.tabs.iter())
            .find(|t| t.id == tab_id)
    }

    /// Tab ids of every window in strip order.
    pub fn order_by_window(&self) -> OrderByWindow {
        self.windows
            .iter()
            .map(|w| (w.id, w.tabs.iter().map(|t| t.id).collect()))
            .collect()
    }
}

/// Where a group of tabs should land inside the destination window.
///
/// On the wire `-1` means the end of the strip, any other non-negative
/// number is an insert-before position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MoveIndex {
    End,
    At(usize),
}

impl TryFrom<i64> for MoveIndex {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(MoveIndex::End),
            i if i >= 0 => Ok(MoveIndex::At(i as usize)),
            other => Err(format!("invalid move index: {}", other)),
        }
    }
}

impl From<MoveIndex> for i64 {
    fn from(index: MoveIndex) -> Self {
        match index {
            MoveIndex::End => -1,
            MoveIndex::At(i) => i as i64,
        }
    }
}

/// Destination of a move: a window and a position inside its strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTarget {
    pub window_id: WindowId,
    pub index: MoveIndex,
}

/// Properties for a tab the platform should create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTab {
    pub window_id: Option<WindowId>,
    pub url: Option<String>,
}

/// Partial update applied to an existing tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabUpdate {
    pub active: Option<bool>,
    pub pinned: Option<bool>,
}

impl TabUpdate {
    pub fn pinned(pinned: bool) -> Self {
        Self { pinned: Some(pinned), ..Self::default() }
    }

    pub fn activate() -> Self {
        Self { active: Some(true), ..Self::default() }
    }
}

/// Properties for a window the platform should create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateWindow {
    /// Existing tab moved into the new window as its first tab.
    pub seed_tab: Option<TabId>,
    pub focused: bool,
}
