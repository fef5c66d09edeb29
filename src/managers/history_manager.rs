//! Visited-tab history.
//!
//! A bounded most-recently-used list of tab ids, fed by tab activations and
//! window focus changes. Kept in memory only.

use std::collections::VecDeque;

use crate::types::tab::TabId;

/// Bounded MRU list of activated tabs, most recent first.
#[derive(Debug, Clone)]
pub struct VisitedHistory {
    entries: VecDeque<TabId>,
    capacity: usize,
}

impl VisitedHistory {
    /// Creates an empty history holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Records an activation at the head, dropping the oldest entry when full.
    ///
    /// Re-activating a tab adds it again; entries are not deduplicated.
    pub fn push(&mut self, tab_id: TabId) {
        self.entries.push_front(tab_id);
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Current entries, most recent first.
    pub fn entries(&self) -> Vec<TabId> {
        self.entries.iter().copied().collect()
    }

    pub fn head(&self) -> Option<TabId> {
        self.entries.front().copied()
    }

    /// Most recent entry that is not `excluding`, e.g. the tab to fall back to
    /// after the active one closes.
    pub fn previous(&self, excluding: TabId) -> Option<TabId> {
        self.entries.iter().copied().find(|&id| id != excluding)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
