//! Tab/window platform abstraction.
//!
//! The browser's tab API is an asynchronous, partially unreliable service.
//! [`TabPlatform`] is the seam every coordinator operation goes through:
//! calls resolve to a `Result` instead of a "last error" slot, and change
//! notifications arrive on a broadcast channel obtained from
//! [`TabPlatform::subscribe`].
//!
//! [`memory::MemoryPlatform`] is a complete in-process implementation used by
//! the gateway binary and the tests.

use std::future::Future;

use tokio::sync::broadcast;

use crate::types::errors::PlatformError;
use crate::types::event::PlatformEvent;
use crate::types::tab::{
    CreateTab, CreateWindow, MoveIndex, Tab, TabId, TabUpdate, Window, WindowId, WindowKind,
};

pub mod memory;
pub mod paths;

pub use memory::MemoryPlatform;

/// Filter for [`TabPlatform::get_all_windows`].
#[derive(Debug, Clone, PartialEq)]
pub struct WindowQuery {
    /// Include each window's tabs.
    pub populate: bool,
    /// Only windows of these kinds; empty means every kind.
    pub kinds: Vec<WindowKind>,
}

impl WindowQuery {
    /// Normal windows with their tabs, the shape the UI tree is built from.
    pub fn normal_populated() -> Self {
        Self {
            populate: true,
            kinds: vec![WindowKind::Normal],
        }
    }

    pub fn matches(&self, kind: WindowKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }
}

/// Asynchronous browser tab/window service.
///
/// Implementations must be shareable across tasks; every returned future is
/// `Send` so batches can fan calls out onto the runtime.
pub trait TabPlatform: Send + Sync + 'static {
    fn get_all_windows(
        &self,
        query: WindowQuery,
    ) -> impl Future<Output = Result<Vec<Window>, PlatformError>> + Send;

    fn get_tab(&self, tab_id: TabId) -> impl Future<Output = Result<Tab, PlatformError>> + Send;

    /// The active tab of a normal window, if it has one.
    fn active_tab(
        &self,
        window_id: WindowId,
    ) -> impl Future<Output = Result<Option<Tab>, PlatformError>> + Send;

    fn create_tab(
        &self,
        props: CreateTab,
    ) -> impl Future<Output = Result<Tab, PlatformError>> + Send;

    fn update_tab(
        &self,
        tab_id: TabId,
        update: TabUpdate,
    ) -> impl Future<Output = Result<Tab, PlatformError>> + Send;

    /// Moves `tab_ids` into `window_id` (or each tab's own window when `None`).
    ///
    /// Relative order of the group is only guaranteed for [`MoveIndex::End`].
    fn move_tabs(
        &self,
        tab_ids: Vec<TabId>,
        window_id: Option<WindowId>,
        index: MoveIndex,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Requests closing a tab. Success only acknowledges the request; the
    /// removal itself is confirmed by [`PlatformEvent::TabRemoved`].
    fn remove_tab(&self, tab_id: TabId) -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn create_window(
        &self,
        props: CreateWindow,
    ) -> impl Future<Output = Result<Window, PlatformError>> + Send;

    fn focus_window(
        &self,
        window_id: WindowId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Requests closing a window, confirmed by [`PlatformEvent::WindowRemoved`].
    fn remove_window(
        &self,
        window_id: WindowId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn subscribe(&self) -> broadcast::Receiver<PlatformEvent>;
}
