//! Coordinator context for TidyTabs.
//!
//! One [`Coordinator`] is created at startup and shared by every command and
//! event handler. It owns the visited history, the debounce slot and the
//! preference store, and drives the platform through the batch primitives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

use crate::managers::batch_manager::{distinct, fan_out, fan_out_confirmed, BatchReport};
use crate::managers::change_notifier::ChangeNotifier;
use crate::managers::history_manager::VisitedHistory;
use crate::platform::TabPlatform;
use crate::services::preference_store::{PreferenceStore, COLOR_OF_KEY};
use crate::services::reorder_engine::{end_move_list, find_duplicates, sort_partitions};
use crate::services::snapshot_builder::build_snapshot;
use crate::types::errors::{CoordinatorError, PlatformError};
use crate::types::event::PlatformEvent;
use crate::types::message::{ItemFailure, PushEvent, Response, Target};
use crate::types::settings::CoordinatorConfig;
use crate::types::tab::{
    CreateTab, CreateWindow, MoveIndex, MoveTarget, Snapshot, Tab, TabId, TabUpdate, WindowId,
};

/// Shared state and operations of the background coordinator.
pub struct Coordinator<P> {
    platform: Arc<P>,
    config: CoordinatorConfig,
    history: Mutex<VisitedHistory>,
    notifier: ChangeNotifier<P>,
    prefs: Mutex<PreferenceStore>,
}

impl<P: TabPlatform> Coordinator<P> {
    /// Creates the coordinator and the receiving end of its push channel.
    pub fn new(
        platform: Arc<P>,
        prefs: PreferenceStore,
        config: CoordinatorConfig,
    ) -> (Self, UnboundedReceiver<PushEvent>) {
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let notifier = ChangeNotifier::new(
            Arc::clone(&platform),
            Duration::from_millis(config.debounce_ms),
            push_tx,
        );
        let coordinator = Self {
            history: Mutex::new(VisitedHistory::new(config.history_capacity)),
            platform,
            config,
            notifier,
            prefs: Mutex::new(prefs),
        };
        (coordinator, push_rx)
    }

    pub fn platform(&self) -> &Arc<P> {
        &self.platform
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn notifier(&self) -> &ChangeNotifier<P> {
        &self.notifier
    }

    fn history(&self) -> MutexGuard<'_, VisitedHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prefs(&self) -> MutexGuard<'_, PreferenceStore> {
        self.prefs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Visited tabs, most recent first.
    pub fn visited(&self) -> Vec<TabId> {
        self.history().entries()
    }

    /// Most recently visited tab other than `closed`.
    pub fn previously_active(&self, closed: TabId) -> Option<TabId> {
        self.history().previous(closed)
    }

    pub async fn snapshot(&self) -> Result<Snapshot, CoordinatorError> {
        Ok(build_snapshot(self.platform.as_ref()).await?)
    }

    /// Fresh tree plus history, the reply to every command that waits for its effect.
    pub async fn tree_response(&self, failures: Vec<ItemFailure>) -> Result<Response, CoordinatorError> {
        let windows = self.snapshot().await?;
        Ok(Response {
            windows,
            visited: self.visited(),
            prefs: None,
            color_of: None,
            failures,
        })
    }

    // ─── Commands ───

    /// Handshake from a UI surface: it becomes active and receives everything it renders from.
    pub async fn init(&self) -> Result<Response, CoordinatorError> {
        self.notifier.set_active(true);
        let (prefs, color_of) = {
            let store = self.prefs();
            (store.synced(), store.get_local(COLOR_OF_KEY)?.unwrap_or_default())
        };
        info!("UI surface connected");
        let mut response = self.tree_response(Vec::new()).await?;
        response.prefs = Some(prefs);
        response.color_of = Some(color_of);
        Ok(response)
    }

    /// The UI surface went away; stop rebroadcasting.
    pub fn popup_inactive(&self) {
        info!("UI surface disconnected");
        self.notifier.set_active(false);
    }

    pub async fn create_tab(&self, window_id: WindowId) -> Result<(), CoordinatorError> {
        self.platform
            .create_tab(CreateTab { window_id: Some(window_id), url: None })
            .await?;
        self.platform.focus_window(window_id).await?;
        Ok(())
    }

    pub async fn create_window(&self) -> Result<(), CoordinatorError> {
        self.platform
            .create_window(CreateWindow { seed_tab: None, focused: true })
            .await?;
        Ok(())
    }

    pub async fn open_url(&self, url: &str) -> Result<(), CoordinatorError> {
        self.platform
            .create_tab(CreateTab { window_id: None, url: Some(url.to_string()) })
            .await?;
        Ok(())
    }

    /// Activates a tab and focuses its window (`window_id` or the tab's own).
    pub async fn focus_tab(&self, tab_id: TabId, window_id: Option<WindowId>) -> Result<(), CoordinatorError> {
        let tab = self.platform.update_tab(tab_id, TabUpdate::activate()).await?;
        self.platform
            .focus_window(window_id.unwrap_or(tab.window_id))
            .await?;
        Ok(())
    }

    pub async fn focus_window(&self, window_id: WindowId) -> Result<(), CoordinatorError> {
        self.platform.focus_window(window_id).await?;
        Ok(())
    }

    pub fn store_string(&self, name: &str, value: &str) -> Result<(), CoordinatorError> {
        self.prefs().set_local(name, value)?;
        Ok(())
    }

    /// Closes tabs, settling once every tab's removal is confirmed or has failed.
    pub async fn remove_tabs(&self, tab_ids: &[TabId]) -> Vec<ItemFailure> {
        let platform = Arc::clone(&self.platform);
        let report = fan_out_confirmed(
            self.platform.as_ref(),
            tab_ids,
            move |tab_id| {
                let platform = Arc::clone(&platform);
                async move { platform.remove_tab(tab_id).await }
            },
            |event| match event {
                PlatformEvent::TabRemoved { tab_id, .. } => Some(*tab_id),
                _ => None,
            },
        )
        .await;
        failures(&report, Target::Tab)
    }

    /// Closes windows, settling once every window's removal is confirmed or has failed.
    pub async fn remove_windows(&self, window_ids: &[WindowId]) -> Vec<ItemFailure> {
        let platform = Arc::clone(&self.platform);
        let report = fan_out_confirmed(
            self.platform.as_ref(),
            window_ids,
            move |window_id| {
                let platform = Arc::clone(&platform);
                async move { platform.remove_window(window_id).await }
            },
            |event| match event {
                PlatformEvent::WindowRemoved { window_id } => Some(*window_id),
                _ => None,
            },
        )
        .await;
        failures(&report, Target::Window)
    }

    /// Flips the pinned flag of every tab individually.
    pub async fn pin_tabs(&self, tab_ids: &[TabId]) -> Vec<ItemFailure> {
        let platform = Arc::clone(&self.platform);
        let report = fan_out(tab_ids, move |tab_id| {
            let platform = Arc::clone(&platform);
            async move {
                let tab = platform.get_tab(tab_id).await?;
                platform
                    .update_tab(tab_id, TabUpdate::pinned(!tab.pinned))
                    .await
                    .map(|_| ())
            }
        })
        .await;
        failures(&report, Target::Tab)
    }

    /// Sorts the selection by the configured key, each window on its own.
    ///
    /// Every window's sorted partition is moved to the end of that window.
    pub async fn sort_tabs(&self, tab_ids: &[TabId]) -> Vec<ItemFailure> {
        let (tabs, mut failed) = self.lookup_tabs(tab_ids).await;
        let partitions = Arc::new(sort_partitions(&tabs, self.config.sort_key));
        let windows: Vec<WindowId> = partitions.keys().copied().collect();

        let platform = Arc::clone(&self.platform);
        let report = fan_out(&windows, move |window_id| {
            let platform = Arc::clone(&platform);
            let ids = partitions.get(&window_id).cloned().unwrap_or_default();
            async move {
                platform
                    .move_tabs(ids, Some(window_id), MoveIndex::End)
                    .await
            }
        })
        .await;
        failed.extend(failures(&report, Target::Window));
        failed
    }

    /// Moves the selection so it sits before position `target.index` of the
    /// destination window (or at its end), using a single end-of-strip move.
    pub async fn move_tabs(
        &self,
        tab_ids: &[TabId],
        target: MoveTarget,
    ) -> Result<Vec<ItemFailure>, CoordinatorError> {
        let order = self.snapshot().await?.order_by_window();
        let destination = order.get(&target.window_id).cloned().unwrap_or_default();
        let moved = end_move_list(&destination, tab_ids, target.index);
        if moved.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Moving {:?} to the end of window {}", moved, target.window_id);
        match self
            .platform
            .move_tabs(moved, Some(target.window_id), MoveIndex::End)
            .await
        {
            Ok(()) => Ok(Vec::new()),
            Err(err) => {
                warn!("Move into window {} failed: {}", target.window_id, err);
                Ok(vec![failure(Target::Window(target.window_id), &err)])
            }
        }
    }

    /// Opens a new window seeded with the first tab and moves the rest after it.
    pub async fn extract_tabs(&self, tab_ids: &[TabId]) -> Vec<ItemFailure> {
        let tab_ids = distinct(tab_ids);
        let Some((&first, rest)) = tab_ids.split_first() else {
            return Vec::new();
        };

        let window = match self
            .platform
            .create_window(CreateWindow { seed_tab: Some(first), focused: false })
            .await
        {
            Ok(window) => window,
            Err(err) => {
                warn!("Could not extract tab {} into a new window: {}", first, err);
                return vec![failure(Target::Tab(first), &err)];
            }
        };
        if rest.is_empty() {
            return Vec::new();
        }

        match self
            .platform
            .move_tabs(rest.to_vec(), Some(window.id), MoveIndex::End)
            .await
        {
            Ok(()) => Vec::new(),
            Err(err) => {
                warn!("Could not move extracted tabs into window {}: {}", window.id, err);
                vec![failure(Target::Window(window.id), &err)]
            }
        }
    }

    /// Closes every tab whose URL already appeared earlier in the selection.
    pub async fn remove_duplicates(&self, tab_ids: &[TabId]) -> Vec<ItemFailure> {
        let (tabs, mut failed) = self.lookup_tabs(tab_ids).await;
        let duplicates = find_duplicates(&tabs);
        if !duplicates.is_empty() {
            info!("Closing {} duplicate tabs", duplicates.len());
            failed.extend(self.remove_tabs(&duplicates).await);
        }
        failed
    }

    /// Reads the selected tabs, returned in selection order.
    async fn lookup_tabs(&self, tab_ids: &[TabId]) -> (Vec<Tab>, Vec<ItemFailure>) {
        let platform = Arc::clone(&self.platform);
        let report = fan_out(tab_ids, move |tab_id| {
            let platform = Arc::clone(&platform);
            async move { platform.get_tab(tab_id).await }
        })
        .await;

        let failed = failures(&report, Target::Tab);
        let mut found: HashMap<TabId, Tab> = report.succeeded.into_iter().collect();
        let tabs = distinct(tab_ids)
            .into_iter()
            .filter_map(|id| found.remove(&id))
            .collect();
        (tabs, failed)
    }

    // ─── Platform events ───

    /// Applies one platform event: history for activations and focus
    /// changes, a debounced rebroadcast for tree changes.
    pub async fn handle_event(&self, event: &PlatformEvent) {
        match event {
            PlatformEvent::TabActivated { tab_id, .. } => {
                self.history().push(*tab_id);
            }
            PlatformEvent::WindowFocusChanged { window_id: Some(window_id) } => {
                match self.platform.active_tab(*window_id).await {
                    Ok(Some(tab)) => {
                        self.history().push(tab.id);
                    }
                    Ok(None) => {}
                    Err(err) => debug!("No active tab for focused window {}: {}", window_id, err),
                }
            }
            _ => {}
        }
        if event.changes_tree() {
            self.notifier.trigger();
        }
    }

    /// Subscribes to platform events and applies them on a background task
    /// until the platform's event stream closes.
    pub fn spawn_event_pump(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.platform.subscribe();
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => coordinator.handle_event(&event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event pump missed {} platform events, forcing a rebroadcast", skipped);
                        coordinator.notifier.trigger();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Platform event stream closed");
        })
    }
}

fn failure(target: Target, err: &PlatformError) -> ItemFailure {
    ItemFailure { target, error: err.to_string() }
}

fn failures<K: Copy, T>(report: &BatchReport<K, T>, target: fn(K) -> Target) -> Vec<ItemFailure> {
    report
        .failed
        .iter()
        .map(|(key, err)| failure(target(*key), err))
        .collect()
}
