//! In-process tab/window platform.
//!
//! Models a browser's windows and tab strips closely enough to drive the
//! coordinator end to end: pinned tabs stay grouped at the left, closing the
//! last tab of a window closes the window, removals are confirmed by events
//! (optionally delayed), and individual tabs can be made to fail.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;

use super::{TabPlatform, WindowQuery};
use crate::types::errors::PlatformError;
use crate::types::event::PlatformEvent;
use crate::types::tab::{
    CreateTab, CreateWindow, MoveIndex, Tab, TabId, TabUpdate, Window, WindowId, WindowKind,
};

const NEW_TAB_URL: &str = "about:newtab";
const NEW_TAB_TITLE: &str = "New Tab";
const EVENT_CAPACITY: usize = 1024;

/// A call received by [`MemoryPlatform`], recorded in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    GetAllWindows,
    GetTab(TabId),
    ActiveTab(WindowId),
    CreateTab(CreateTab),
    UpdateTab(TabId, TabUpdate),
    MoveTabs {
        tab_ids: Vec<TabId>,
        window_id: Option<WindowId>,
        index: MoveIndex,
    },
    RemoveTab(TabId),
    CreateWindow(CreateWindow),
    FocusWindow(WindowId),
    RemoveWindow(WindowId),
}

#[derive(Debug, Clone)]
struct TabRecord {
    id: TabId,
    url: String,
    title: String,
    pinned: bool,
    active: bool,
}

#[derive(Debug, Clone)]
struct WindowRecord {
    id: WindowId,
    focused: bool,
    kind: WindowKind,
    tabs: Vec<TabRecord>,
}

impl WindowRecord {
    fn position(&self, tab_id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    /// Count of pinned tabs (they are always at the left).
    fn pinned_count(&self) -> usize {
        self.tabs.iter().filter(|t| t.pinned).count()
    }

    fn to_window(&self, populate: bool) -> Window {
        Window {
            id: self.id,
            focused: self.focused,
            kind: self.kind,
            tabs: if populate {
                (0..self.tabs.len()).map(|i| self.tab_at(i)).collect()
            } else {
                Vec::new()
            },
        }
    }

    fn tab_at(&self, index: usize) -> Tab {
        let record = &self.tabs[index];
        Tab {
            id: record.id,
            window_id: self.id,
            index,
            url: record.url.clone(),
            title: record.title.clone(),
            pinned: record.pinned,
            active: record.active,
        }
    }

    /// Removes the tab at `index`, handing the active flag to its nearest neighbor.
    fn take_tab(&mut self, index: usize) -> TabRecord {
        let mut record = self.tabs.remove(index);
        if record.active && !self.tabs.is_empty() {
            let neighbor = index.min(self.tabs.len() - 1);
            self.tabs[neighbor].active = true;
        }
        record.active = false;
        record
    }
}

#[derive(Debug, Default)]
struct BrowserState {
    windows: Vec<WindowRecord>,
    next_id: i64,
    failing: HashSet<TabId>,
    calls: Vec<PlatformCall>,
}

impl BrowserState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn window_index(&self, window_id: WindowId) -> Option<usize> {
        self.windows.iter().position(|w| w.id == window_id)
    }

    /// (window slot, tab slot) of a tab.
    fn locate(&self, tab_id: TabId) -> Option<(usize, usize)> {
        self.windows
            .iter()
            .enumerate()
            .find_map(|(wi, w)| w.position(tab_id).map(|ti| (wi, ti)))
    }

    fn check_tab(&self, tab_id: TabId) -> Result<(usize, usize), PlatformError> {
        if self.failing.contains(&tab_id) {
            return Err(PlatformError::Rejected(format!("tab {} refused the request", tab_id)));
        }
        self.locate(tab_id).ok_or(PlatformError::TabNotFound(tab_id))
    }

    fn default_window(&self) -> Option<usize> {
        self.windows
            .iter()
            .position(|w| w.focused && w.kind == WindowKind::Normal)
            .or_else(|| self.windows.iter().position(|w| w.kind == WindowKind::Normal))
    }

    fn focus(&mut self, window_id: WindowId, events: &mut Vec<PlatformEvent>) {
        for window in &mut self.windows {
            window.focused = window.id == window_id;
        }
        events.push(PlatformEvent::WindowFocusChanged { window_id: Some(window_id) });
    }

    /// Drops the window at `slot` if its strip became empty.
    fn close_if_empty(&mut self, slot: usize, events: &mut Vec<PlatformEvent>) {
        if self.windows[slot].tabs.is_empty() {
            let window = self.windows.remove(slot);
            events.push(PlatformEvent::WindowRemoved { window_id: window.id });
        }
    }

    /// Detaches a tab from its window, closing the window when it empties.
    fn detach(&mut self, tab_id: TabId, events: &mut Vec<PlatformEvent>) -> Option<TabRecord> {
        let (wi, ti) = self.locate(tab_id)?;
        let old_window_id = self.windows[wi].id;
        let record = self.windows[wi].take_tab(ti);
        events.push(PlatformEvent::TabDetached { tab_id, old_window_id });
        self.close_if_empty(wi, events);
        Some(record)
    }

    /// Inserts a tab into a window, keeping pinned tabs ahead of unpinned ones.
    fn attach(&mut self, slot: usize, index: usize, mut record: TabRecord) -> usize {
        let window = &mut self.windows[slot];
        let pinned = window.pinned_count();
        let index = if record.pinned {
            index.min(pinned)
        } else {
            index.clamp(pinned, window.tabs.len())
        };
        if window.tabs.is_empty() {
            record.active = true;
        }
        window.tabs.insert(index, record);
        index
    }
}

/// Browser model kept entirely in memory.
pub struct MemoryPlatform {
    state: Mutex<BrowserState>,
    events: broadcast::Sender<PlatformEvent>,
    removal_delay: Mutex<Option<Duration>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(BrowserState::default()),
            events,
            removal_delay: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a normal window with one tab per URL and returns its ids.
    ///
    /// The first window opened gets focus; the first tab of each window is active.
    pub fn open_window(&self, urls: &[&str]) -> (WindowId, Vec<TabId>) {
        self.open_window_of_kind(WindowKind::Normal, urls)
    }

    pub fn open_window_of_kind(&self, kind: WindowKind, urls: &[&str]) -> (WindowId, Vec<TabId>) {
        let mut state = self.lock();
        let window_id = state.allocate_id();
        let mut tabs = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            let id = state.allocate_id();
            tabs.push(TabRecord {
                id,
                url: url.to_string(),
                title: url.to_string(),
                pinned: false,
                active: i == 0,
            });
        }
        let ids = tabs.iter().map(|t| t.id).collect();
        let focused = state.windows.is_empty();
        state.windows.push(WindowRecord { id: window_id, focused, kind, tabs });
        (window_id, ids)
    }

    /// Makes every call touching `tab_id` fail.
    pub fn set_failing(&self, tab_id: TabId) {
        self.lock().failing.insert(tab_id);
    }

    /// Delays removal confirmations by `delay` after the request is acknowledged.
    pub fn set_removal_delay(&self, delay: Duration) {
        *self.removal_delay.lock().unwrap_or_else(PoisonError::into_inner) = Some(delay);
    }

    /// Delivers an arbitrary event to subscribers.
    pub fn emit(&self, event: PlatformEvent) {
        let _ = self.events.send(event);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&PlatformCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Tab ids of a window in strip order, empty if the window is gone.
    pub fn tab_order(&self, window_id: WindowId) -> Vec<TabId> {
        let state = self.lock();
        state
            .window_index(window_id)
            .map(|slot| state.windows[slot].tabs.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    pub fn tab(&self, tab_id: TabId) -> Option<Tab> {
        let state = self.lock();
        state.locate(tab_id).map(|(wi, ti)| state.windows[wi].tab_at(ti))
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.lock().windows.iter().map(|w| w.id).collect()
    }

    fn record(&self, call: PlatformCall) -> MutexGuard<'_, BrowserState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }

    fn dispatch(&self, events: Vec<PlatformEvent>) {
        let delay = *self.removal_delay.lock().unwrap_or_else(PoisonError::into_inner);
        for event in events {
            let is_removal = matches!(
                event,
                PlatformEvent::TabRemoved { .. } | PlatformEvent::WindowRemoved { .. }
            );
            match delay {
                Some(delay) if is_removal => {
                    let sender = self.events.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = sender.send(event);
                    });
                }
                _ => {
                    let _ = self.events.send(event);
                }
            }
        }
    }

    fn do_update(&self, tab_id: TabId, update: TabUpdate) -> Result<Tab, PlatformError> {
        let mut events = Vec::new();
        let tab = {
            let mut state = self.record(PlatformCall::UpdateTab(tab_id, update.clone()));
            let (wi, mut ti) = state.check_tab(tab_id)?;
            let window_id = state.windows[wi].id;

            if let Some(pinned) = update.pinned {
                if state.windows[wi].tabs[ti].pinned != pinned {
                    // Pinning moves the tab to the end of the pinned group,
                    // unpinning moves it just after it.
                    let mut record = state.windows[wi].tabs.remove(ti);
                    record.pinned = pinned;
                    let to = state.windows[wi].pinned_count();
                    state.windows[wi].tabs.insert(to, record);
                    events.push(PlatformEvent::TabUpdated { tab_id, pinned: Some(pinned) });
                    if to != ti {
                        events.push(PlatformEvent::TabMoved {
                            tab_id,
                            window_id,
                            from_index: ti,
                            to_index: to,
                        });
                    }
                    ti = to;
                }
            }

            if update.active == Some(true) && !state.windows[wi].tabs[ti].active {
                for (i, record) in state.windows[wi].tabs.iter_mut().enumerate() {
                    record.active = i == ti;
                }
                events.push(PlatformEvent::TabActivated { tab_id, window_id });
            }

            state.windows[wi].tab_at(ti)
        };
        self.dispatch(events);
        Ok(tab)
    }

    fn do_move(
        &self,
        tab_ids: Vec<TabId>,
        window_id: Option<WindowId>,
        index: MoveIndex,
    ) -> Result<(), PlatformError> {
        let mut events = Vec::new();
        {
            let mut state = self.record(PlatformCall::MoveTabs {
                tab_ids: tab_ids.clone(),
                window_id,
                index,
            });
            for &tab_id in &tab_ids {
                state.check_tab(tab_id)?;
            }
            if let Some(target) = window_id {
                state.window_index(target).ok_or(PlatformError::WindowNotFound(target))?;
            }

            for (offset, &tab_id) in tab_ids.iter().enumerate() {
                let Some((wi, ti)) = state.locate(tab_id) else {
                    continue;
                };
                let source_id = state.windows[wi].id;
                let target_id = window_id.unwrap_or(source_id);

                if target_id == source_id {
                    let mut record = state.windows[wi].tabs.remove(ti);
                    let was_active = record.active;
                    record.active = false;
                    let requested = match index {
                        MoveIndex::End => state.windows[wi].tabs.len(),
                        MoveIndex::At(i) => i + offset,
                    };
                    let to = state.attach(wi, requested, record);
                    state.windows[wi].tabs[to].active = was_active;
                    if to != ti {
                        events.push(PlatformEvent::TabMoved {
                            tab_id,
                            window_id: source_id,
                            from_index: ti,
                            to_index: to,
                        });
                    }
                } else {
                    let Some(record) = state.detach(tab_id, &mut events) else {
                        continue;
                    };
                    // The source window may have closed, so resolve the slot again.
                    let Some(slot) = state.window_index(target_id) else {
                        continue;
                    };
                    let requested = match index {
                        MoveIndex::End => state.windows[slot].tabs.len(),
                        MoveIndex::At(i) => i + offset,
                    };
                    state.attach(slot, requested, record);
                    events.push(PlatformEvent::TabAttached { tab_id, new_window_id: target_id });
                }
            }
        }
        self.dispatch(events);
        Ok(())
    }

    fn do_remove_tab(&self, tab_id: TabId) -> Result<(), PlatformError> {
        let mut events = Vec::new();
        {
            let mut state = self.record(PlatformCall::RemoveTab(tab_id));
            let (wi, ti) = state.check_tab(tab_id)?;
            let window_id = state.windows[wi].id;
            state.windows[wi].take_tab(ti);
            let window_closing = state.windows[wi].tabs.is_empty();
            events.push(PlatformEvent::TabRemoved { tab_id, window_id, window_closing });
            state.close_if_empty(wi, &mut events);
        }
        self.dispatch(events);
        Ok(())
    }

    fn do_create_window(&self, props: CreateWindow) -> Result<Window, PlatformError> {
        let mut events = Vec::new();
        let window = {
            let mut state = self.record(PlatformCall::CreateWindow(props.clone()));
            if let Some(seed) = props.seed_tab {
                state.check_tab(seed)?;
            }
            let window_id = state.allocate_id();
            state.windows.push(WindowRecord {
                id: window_id,
                focused: false,
                kind: WindowKind::Normal,
                tabs: Vec::new(),
            });
            events.push(PlatformEvent::WindowCreated { window_id });

            match props.seed_tab.and_then(|seed| state.detach(seed, &mut events)) {
                Some(record) => {
                    let tab_id = record.id;
                    let slot = state.window_index(window_id).ok_or(PlatformError::WindowNotFound(window_id))?;
                    state.attach(slot, 0, record);
                    events.push(PlatformEvent::TabAttached { tab_id, new_window_id: window_id });
                }
                None => {
                    let tab_id = state.allocate_id();
                    let slot = state.window_index(window_id).ok_or(PlatformError::WindowNotFound(window_id))?;
                    state.attach(
                        slot,
                        0,
                        TabRecord {
                            id: tab_id,
                            url: NEW_TAB_URL.to_string(),
                            title: NEW_TAB_TITLE.to_string(),
                            pinned: false,
                            active: true,
                        },
                    );
                    events.push(PlatformEvent::TabCreated { tab_id, window_id });
                }
            }

            if props.focused {
                state.focus(window_id, &mut events);
            }
            let slot = state.window_index(window_id).ok_or(PlatformError::WindowNotFound(window_id))?;
            state.windows[slot].to_window(true)
        };
        self.dispatch(events);
        Ok(window)
    }
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl TabPlatform for MemoryPlatform {
    fn get_all_windows(
        &self,
        query: WindowQuery,
    ) -> impl Future<Output = Result<Vec<Window>, PlatformError>> + Send {
        let state = self.record(PlatformCall::GetAllWindows);
        let windows = state
            .windows
            .iter()
            .filter(|w| query.matches(w.kind))
            .map(|w| w.to_window(query.populate))
            .collect();
        drop(state);
        async move { Ok(windows) }
    }

    fn get_tab(&self, tab_id: TabId) -> impl Future<Output = Result<Tab, PlatformError>> + Send {
        let state = self.record(PlatformCall::GetTab(tab_id));
        let result = state
            .check_tab(tab_id)
            .map(|(wi, ti)| state.windows[wi].tab_at(ti));
        drop(state);
        async move { result }
    }

    fn active_tab(
        &self,
        window_id: WindowId,
    ) -> impl Future<Output = Result<Option<Tab>, PlatformError>> + Send {
        let state = self.record(PlatformCall::ActiveTab(window_id));
        let result = match state.window_index(window_id) {
            Some(slot) if state.windows[slot].kind == WindowKind::Normal => {
                let window = &state.windows[slot];
                Ok(window.tabs.iter().position(|t| t.active).map(|i| window.tab_at(i)))
            }
            Some(_) => Ok(None),
            None => Err(PlatformError::WindowNotFound(window_id)),
        };
        drop(state);
        async move { result }
    }

    fn create_tab(
        &self,
        props: CreateTab,
    ) -> impl Future<Output = Result<Tab, PlatformError>> + Send {
        let mut events = Vec::new();
        let result = {
            let mut state = self.record(PlatformCall::CreateTab(props.clone()));
            let slot = match props.window_id {
                Some(window_id) => state.window_index(window_id).ok_or(PlatformError::WindowNotFound(window_id)),
                None => state
                    .default_window()
                    .ok_or_else(|| PlatformError::Rejected("no window to open a tab in".to_string())),
            };
            slot.map(|slot| {
                let tab_id = state.allocate_id();
                let url = props.url.clone().unwrap_or_else(|| NEW_TAB_URL.to_string());
                let title = if props.url.is_some() { url.clone() } else { NEW_TAB_TITLE.to_string() };
                let window = &mut state.windows[slot];
                for record in &mut window.tabs {
                    record.active = false;
                }
                window.tabs.push(TabRecord { id: tab_id, url, title, pinned: false, active: true });
                let window_id = window.id;
                events.push(PlatformEvent::TabCreated { tab_id, window_id });
                events.push(PlatformEvent::TabActivated { tab_id, window_id });
                window.tab_at(window.tabs.len() - 1)
            })
        };
        self.dispatch(events);
        async move { result }
    }

    fn update_tab(
        &self,
        tab_id: TabId,
        update: TabUpdate,
    ) -> impl Future<Output = Result<Tab, PlatformError>> + Send {
        let result = self.do_update(tab_id, update);
        async move { result }
    }

    fn move_tabs(
        &self,
        tab_ids: Vec<TabId>,
        window_id: Option<WindowId>,
        index: MoveIndex,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send {
        let result = self.do_move(tab_ids, window_id, index);
        async move { result }
    }

    fn remove_tab(&self, tab_id: TabId) -> impl Future<Output = Result<(), PlatformError>> + Send {
        let result = self.do_remove_tab(tab_id);
        async move { result }
    }

    fn create_window(
        &self,
        props: CreateWindow,
    ) -> impl Future<Output = Result<Window, PlatformError>> + Send {
        let result = self.do_create_window(props);
        async move { result }
    }

    fn focus_window(
        &self,
        window_id: WindowId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send {
        let mut events = Vec::new();
        let result = {
            let mut state = self.record(PlatformCall::FocusWindow(window_id));
            match state.window_index(window_id) {
                Some(_) => {
                    state.focus(window_id, &mut events);
                    Ok(())
                }
                None => Err(PlatformError::WindowNotFound(window_id)),
            }
        };
        self.dispatch(events);
        async move { result }
    }

    fn remove_window(
        &self,
        window_id: WindowId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send {
        let mut events = Vec::new();
        let result = {
            let mut state = self.record(PlatformCall::RemoveWindow(window_id));
            match state.window_index(window_id) {
                Some(slot) => {
                    let window = state.windows.remove(slot);
                    for record in &window.tabs {
                        events.push(PlatformEvent::TabRemoved {
                            tab_id: record.id,
                            window_id,
                            window_closing: true,
                        });
                    }
                    events.push(PlatformEvent::WindowRemoved { window_id });
                    Ok(())
                }
                None => Err(PlatformError::WindowNotFound(window_id)),
            }
        };
        self.dispatch(events);
        async move { result }
    }

    fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.events.subscribe()
    }
}
