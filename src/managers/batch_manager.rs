//! Batch operation coordinator.
//!
//! Fans a per-item async action out over a set of ids and joins the reports
//! into a single [`BatchReport`]. A failing item is logged and still counts
//! toward completion; nothing aborts a batch once it has started.
//!
//! Removals use [`fan_out_confirmed`]: an item only reports success when the
//! platform's lifecycle event confirms it, because the acknowledgement of a
//! close request can arrive before the tab (or its window) is actually gone.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

use log::warn;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinSet;

use crate::platform::TabPlatform;
use crate::types::errors::PlatformError;
use crate::types::event::PlatformEvent;

/// Result of a settled batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<K, T = ()> {
    /// Number of distinct items the batch was created with.
    pub expected: usize,
    /// Successful items with their values, in report order.
    pub succeeded: Vec<(K, T)>,
    /// Failed items with their errors, in report order.
    pub failed: Vec<(K, PlatformError)>,
}

impl<K, T> BatchReport<K, T> {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.succeeded.iter().map(|(_, v)| v)
    }
}

/// Counter for one in-flight batch.
///
/// The expected count is fixed from the item set at creation. Each expected
/// item is counted once; reports for unknown or already-reported items are
/// ignored. [`PendingBatch::report`] yields the [`BatchReport`] exactly once,
/// on the report that completes the set.
#[derive(Debug)]
pub struct PendingBatch<K, T = ()> {
    outstanding: HashSet<K>,
    expected: usize,
    succeeded: Vec<(K, T)>,
    failed: Vec<(K, PlatformError)>,
    settled: bool,
}

impl<K, T> PendingBatch<K, T>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(items: impl IntoIterator<Item = K>) -> Self {
        let outstanding: HashSet<K> = items.into_iter().collect();
        Self {
            expected: outstanding.len(),
            outstanding,
            succeeded: Vec::new(),
            failed: Vec::new(),
            settled: false,
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn completed(&self) -> usize {
        self.expected - self.outstanding.len()
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn is_outstanding(&self, key: &K) -> bool {
        self.outstanding.contains(key)
    }

    /// Records one item's outcome. Returns the report when this was the last one.
    pub fn report(&mut self, key: K, outcome: Result<T, PlatformError>) -> Option<BatchReport<K, T>> {
        if self.settled || !self.outstanding.remove(&key) {
            return None;
        }
        match outcome {
            Ok(value) => self.succeeded.push((key, value)),
            Err(err) => {
                warn!("Batch item {:?} failed: {}", key, err);
                self.failed.push((key, err));
            }
        }
        self.try_settle()
    }

    /// Settles an empty batch, or one whose last item just reported.
    pub fn try_settle(&mut self) -> Option<BatchReport<K, T>> {
        if self.settled || !self.outstanding.is_empty() {
            return None;
        }
        self.settled = true;
        Some(BatchReport {
            expected: self.expected,
            succeeded: std::mem::take(&mut self.succeeded),
            failed: std::mem::take(&mut self.failed),
        })
    }

    /// Fails every item still waiting, settling the batch.
    fn abandon(&mut self, err: PlatformError) -> Option<BatchReport<K, T>> {
        let remaining: Vec<K> = self.outstanding.iter().cloned().collect();
        let mut report = None;
        for key in remaining {
            report = report.or(self.report(key, Err(err.clone())));
        }
        report
    }
}

/// Removes repeated ids, keeping the first occurrence of each.
pub fn distinct<K: Eq + Hash + Clone>(items: &[K]) -> Vec<K> {
    let mut seen = HashSet::new();
    items.iter().filter(|k| seen.insert((*k).clone())).cloned().collect()
}

/// Runs `action` once per distinct item and waits for every result.
pub async fn fan_out<K, T, F, Fut>(items: &[K], action: F) -> BatchReport<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    T: Send + 'static,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<T, PlatformError>> + Send + 'static,
{
    let items = distinct(items);
    let mut batch = PendingBatch::new(items.iter().cloned());
    if let Some(report) = batch.try_settle() {
        return report;
    }

    let mut tasks = JoinSet::new();
    let mut keys = HashMap::new();
    for key in items {
        let handle = tasks.spawn(action(key.clone()));
        keys.insert(handle.id(), key);
    }

    while let Some(joined) = tasks.join_next_with_id().await {
        let (key, outcome) = match joined {
            Ok((id, outcome)) => (keys.remove(&id), outcome),
            Err(err) => (keys.remove(&err.id()), Err(PlatformError::TaskFailed(err.to_string()))),
        };
        if let Some(report) = key.and_then(|key| batch.report(key, outcome)) {
            return report;
        }
    }

    // Only reachable if a task id went missing; settle whatever is left.
    batch
        .abandon(PlatformError::TaskFailed("batch task lost".to_string()))
        .unwrap_or(BatchReport { expected: 0, succeeded: Vec::new(), failed: Vec::new() })
}

/// Runs `action` once per distinct item, counting an item as done only when
/// `confirm` maps a platform event to it, or when its action fails.
///
/// The event subscription is taken before any action is spawned and dropped
/// when the batch settles. A lost confirmation stalls the batch; a closed
/// event stream fails every outstanding item with
/// [`PlatformError::Disconnected`].
pub async fn fan_out_confirmed<P, K, F, Fut, C>(
    platform: &P,
    items: &[K],
    action: F,
    confirm: C,
) -> BatchReport<K>
where
    P: TabPlatform,
    K: Eq + Hash + Clone + Debug + Send + 'static,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<(), PlatformError>> + Send + 'static,
    C: Fn(&PlatformEvent) -> Option<K>,
{
    let items = distinct(items);
    let mut batch: PendingBatch<K> = PendingBatch::new(items.iter().cloned());
    if let Some(report) = batch.try_settle() {
        return report;
    }

    let mut events = platform.subscribe();
    let mut tasks = JoinSet::new();
    let mut keys = HashMap::new();
    for key in items {
        let handle = tasks.spawn(action(key.clone()));
        keys.insert(handle.id(), key);
    }

    loop {
        tokio::select! {
            Some(joined) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                // An acknowledged request still waits for its event.
                let failed = match joined {
                    Ok((_, Ok(()))) => None,
                    Ok((id, Err(err))) => keys.remove(&id).map(|key| (key, err)),
                    Err(err) => keys
                        .remove(&err.id())
                        .map(|key| (key, PlatformError::TaskFailed(err.to_string()))),
                };
                if let Some(report) = failed.and_then(|(key, err)| batch.report(key, Err(err))) {
                    return report;
                }
            }
            received = events.recv() => match received {
                Ok(event) => {
                    if let Some(report) = confirm(&event).and_then(|key| batch.report(key, Ok(()))) {
                        return report;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} platform events while waiting for a batch", skipped);
                }
                Err(RecvError::Closed) => {
                    if let Some(report) = batch.abandon(PlatformError::Disconnected) {
                        return report;
                    }
                }
            }
        }
    }
}
