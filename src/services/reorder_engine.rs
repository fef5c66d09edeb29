//! Tab reordering engine.
//!
//! The platform only keeps a group of tabs in order when it moves them to the
//! end of a strip. Inserting at an arbitrary index is therefore expressed as
//! one end-of-strip move of the selection followed by every tab that used to
//! sit at or after the insertion point. Everything in this module is pure;
//! the coordinator performs the single move call per window.

use std::collections::{BTreeMap, HashSet};

use crate::managers::batch_manager::distinct;
use crate::types::settings::SortKey;
use crate::types::tab::{MoveIndex, MoveTarget, OrderByWindow, Tab, TabId, WindowId};

/// Ids to move to the end of the destination strip so that the selection lands at `index`.
///
/// For [`MoveIndex::End`] that is the selection itself. For `At(i)` it is the
/// selection followed by the tabs currently at position `>= i` that are not
/// part of the selection, in their current order.
pub fn end_move_list(destination: &[TabId], selection: &[TabId], index: MoveIndex) -> Vec<TabId> {
    let selection = distinct(selection);
    match index {
        MoveIndex::End => selection,
        MoveIndex::At(i) => {
            let selected: HashSet<TabId> = selection.iter().copied().collect();
            let trailing = destination
                .iter()
                .skip(i)
                .filter(|id| !selected.contains(id))
                .copied();
            selection.iter().copied().chain(trailing).collect()
        }
    }
}

/// Order of every window after moving `selection` to `target`.
///
/// Non-destination windows lose the selected tabs; the destination keeps its
/// unselected tabs before the insertion point, then the selection in the
/// given order, then its unselected trailing tabs.
pub fn reorder(current: &OrderByWindow, selection: &[TabId], target: MoveTarget) -> OrderByWindow {
    let selection = distinct(selection);
    let selected: HashSet<TabId> = selection.iter().copied().collect();
    let destination = current.get(&target.window_id).cloned().unwrap_or_default();
    let moved = end_move_list(&destination, &selection, target.index);
    let moved_set: HashSet<TabId> = moved.iter().copied().collect();

    let mut result: OrderByWindow = current
        .iter()
        .map(|(&window_id, order)| {
            let kept = order.iter().filter(|id| !selected.contains(id)).copied().collect();
            (window_id, kept)
        })
        .collect();

    let staying: Vec<TabId> = destination
        .iter()
        .filter(|id| !moved_set.contains(id))
        .copied()
        .collect();
    result.insert(target.window_id, staying.into_iter().chain(moved).collect());
    result
}

/// Sort key of a tab, compared by code point.
fn sort_key(tab: &Tab, key: SortKey) -> String {
    match key {
        SortKey::Url => tab.url.clone(),
        SortKey::UrlTitle => format!("{}{}", tab.url, tab.title),
    }
}

/// Sorts `tabs` and partitions them by window.
///
/// Each window's list is the order its selected tabs should be moved to the
/// end of that window. The sort is stable, so equal keys keep input order.
pub fn sort_partitions(tabs: &[Tab], key: SortKey) -> BTreeMap<WindowId, Vec<TabId>> {
    let mut keyed: Vec<(String, &Tab)> = tabs.iter().map(|t| (sort_key(t, key), t)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut partitions: BTreeMap<WindowId, Vec<TabId>> = BTreeMap::new();
    for (_, tab) in keyed {
        let ids = partitions.entry(tab.window_id).or_default();
        if !ids.contains(&tab.id) {
            ids.push(tab.id);
        }
    }
    partitions
}

/// Tabs whose URL already appeared earlier in `tabs`, in scan order.
pub fn find_duplicates(tabs: &[Tab]) -> Vec<TabId> {
    let mut seen: HashSet<&str> = HashSet::new();
    tabs.iter()
        .filter(|tab| !seen.insert(tab.url.as_str()))
        .map(|tab| tab.id)
        .collect()
}
