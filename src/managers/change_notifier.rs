//! Debounced tree-change notifier.
//!
//! Bursts of platform events (a sort moves every tab in a window, closing a
//! window removes all of its tabs) collapse into one `newTree` push sent
//! after a quiet interval. A single slot owns the scheduled rebroadcast;
//! scheduling a new one aborts the previous task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::platform::TabPlatform;
use crate::services::snapshot_builder::build_snapshot;
use crate::types::message::PushEvent;

/// Whether a rebroadcast is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    Idle,
    Pending,
}

#[derive(Debug, Default)]
struct Slot {
    active: bool,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Slot {
    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Coalesces tree changes into delayed snapshot pushes to the UI.
pub struct ChangeNotifier<P> {
    platform: Arc<P>,
    quiet: Duration,
    push: UnboundedSender<PushEvent>,
    slot: Arc<Mutex<Slot>>,
}

impl<P: TabPlatform> ChangeNotifier<P> {
    pub fn new(platform: Arc<P>, quiet: Duration, push: UnboundedSender<PushEvent>) -> Self {
        Self {
            platform,
            quiet,
            push,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        lock_slot(&self.slot)
    }

    pub fn state(&self) -> NotifierState {
        if self.lock().task.is_some() {
            NotifierState::Pending
        } else {
            NotifierState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Marks whether a UI surface is listening. Going inactive drops any
    /// scheduled rebroadcast.
    pub fn set_active(&self, active: bool) {
        let mut slot = self.lock();
        slot.active = active;
        if !active {
            slot.cancel();
        }
    }

    /// (Re)schedules a rebroadcast after the quiet interval.
    ///
    /// Does nothing while no UI surface is active. Must be called from within
    /// a tokio runtime.
    pub fn trigger(&self) {
        let mut slot = self.lock();
        if !slot.active {
            return;
        }
        slot.cancel();
        slot.generation += 1;
        let generation = slot.generation;
        debug!("Tree change, rebroadcast #{} in {:?}", generation, self.quiet);

        let platform = Arc::clone(&self.platform);
        let push = self.push.clone();
        let shared = Arc::clone(&self.slot);
        let quiet = self.quiet;
        slot.task = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            let snapshot = build_snapshot(platform.as_ref()).await;
            {
                let mut slot = lock_slot(&shared);
                // A newer trigger or a deactivation owns the slot now.
                if slot.generation != generation || !slot.active {
                    return;
                }
                slot.task = None;
            }
            match snapshot {
                Ok(windows) => {
                    let _ = push.send(PushEvent::NewTree { windows });
                }
                Err(err) => warn!("Could not rebuild the tree for a push: {}", err),
            }
        }));
    }
}

impl<P> Drop for ChangeNotifier<P> {
    fn drop(&mut self) {
        lock_slot(&self.slot).cancel();
    }
}

fn lock_slot(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
