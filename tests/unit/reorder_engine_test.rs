//! Unit tests for the tab reordering engine.

use std::collections::BTreeMap;

use rstest::rstest;
use tidytabs::services::reorder_engine::{end_move_list, find_duplicates, reorder, sort_partitions};
use tidytabs::types::settings::SortKey;
use tidytabs::types::tab::{MoveIndex, MoveTarget, OrderByWindow, Tab};

fn tab(id: i64, window_id: i64, url: &str, title: &str) -> Tab {
    Tab {
        id,
        window_id,
        index: 0,
        url: url.to_string(),
        title: title.to_string(),
        pinned: false,
        active: false,
    }
}

fn order(windows: &[(i64, &[i64])]) -> OrderByWindow {
    windows.iter().map(|(w, ids)| (*w, ids.to_vec())).collect()
}

// ─── end_move_list ───

#[rstest]
#[case(&[1, 2, 3, 4], &[4], MoveIndex::End, vec![4])]
#[case(&[1, 2, 3, 4], &[4], MoveIndex::At(1), vec![4, 2, 3])]
#[case(&[1, 2, 3, 4], &[1, 2], MoveIndex::At(3), vec![1, 2, 4])]
#[case(&[1, 2, 3, 4], &[3, 1], MoveIndex::At(0), vec![3, 1, 2, 4])]
#[case(&[1, 2], &[9], MoveIndex::At(0), vec![9, 1, 2])]
#[case(&[], &[9], MoveIndex::At(0), vec![9])]
fn test_end_move_list(
    #[case] destination: &[i64],
    #[case] selection: &[i64],
    #[case] index: MoveIndex,
    #[case] expected: Vec<i64>,
) {
    assert_eq!(end_move_list(destination, selection, index), expected);
}

// ─── reorder ───

#[test]
fn test_move_to_end_appends_selection_in_given_order() {
    let current = order(&[(1, &[10, 11, 12, 13])]);
    let result = reorder(&current, &[12, 10], MoveTarget { window_id: 1, index: MoveIndex::End });
    assert_eq!(result[&1], vec![11, 13, 12, 10]);
}

#[test]
fn test_insert_before_index() {
    let current = order(&[(1, &[10, 11, 12, 13, 14])]);
    let result = reorder(&current, &[14, 10], MoveTarget { window_id: 1, index: MoveIndex::At(2) });
    assert_eq!(result[&1], vec![11, 14, 10, 12, 13]);
}

#[test]
fn test_moving_across_windows_removes_from_source() {
    let current = order(&[(1, &[10, 11, 12]), (2, &[20, 21])]);
    let result = reorder(&current, &[11, 12], MoveTarget { window_id: 2, index: MoveIndex::At(1) });
    assert_eq!(result[&1], vec![10]);
    assert_eq!(result[&2], vec![20, 11, 12, 21]);
}

#[test]
fn test_move_into_unknown_window_creates_its_order() {
    let current = order(&[(1, &[10, 11])]);
    let result = reorder(&current, &[11], MoveTarget { window_id: 5, index: MoveIndex::End });
    assert_eq!(result[&1], vec![10]);
    assert_eq!(result[&5], vec![11]);
}

// ─── sort_partitions ───

#[test]
fn test_sort_single_window_by_url() {
    let tabs = vec![tab(1, 1, "b", ""), tab(2, 1, "a", ""), tab(3, 1, "c", "")];
    let partitions = sort_partitions(&tabs, SortKey::Url);
    assert_eq!(partitions, BTreeMap::from([(1, vec![2, 1, 3])]));
}

#[test]
fn test_sort_splits_selection_per_window() {
    let tabs = vec![
        tab(1, 1, "z", ""),
        tab(2, 2, "y", ""),
        tab(3, 1, "a", ""),
        tab(4, 2, "b", ""),
    ];
    let partitions = sort_partitions(&tabs, SortKey::Url);
    assert_eq!(partitions[&1], vec![3, 1]);
    assert_eq!(partitions[&2], vec![4, 2]);
}

#[rstest]
#[case(SortKey::Url, vec![1, 2])]
#[case(SortKey::UrlTitle, vec![2, 1])]
fn test_sort_key_breaks_url_ties(#[case] key: SortKey, #[case] expected: Vec<i64>) {
    let tabs = vec![tab(1, 1, "https://x", "beta"), tab(2, 1, "https://x", "alpha")];
    assert_eq!(sort_partitions(&tabs, key)[&1], expected);
}

#[test]
fn test_sort_compares_code_points() {
    let tabs = vec![tab(1, 1, "a", ""), tab(2, 1, "B", ""), tab(3, 1, "_", "")];
    // 'B' (0x42) < '_' (0x5F) < 'a' (0x61)
    assert_eq!(sort_partitions(&tabs, SortKey::Url)[&1], vec![2, 3, 1]);
}

// ─── find_duplicates ───

#[test]
fn test_duplicates_keep_first_occurrence() {
    let tabs = vec![
        tab(1, 1, "x", ""),
        tab(2, 1, "y", ""),
        tab(3, 2, "x", ""),
        tab(4, 1, "z", ""),
        tab(5, 2, "y", ""),
    ];
    assert_eq!(find_duplicates(&tabs), vec![3, 5]);
}

#[test]
fn test_no_duplicates() {
    let tabs = vec![tab(1, 1, "x", ""), tab(2, 1, "y", "")];
    assert!(find_duplicates(&tabs).is_empty());
}
