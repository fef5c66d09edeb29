//! Property-based tests for the visited-tab history.
//!
//! For any sequence of N activations and capacity C, the history holds
//! min(N, C) entries, the head is the last activation, and the entries are
//! the last activations in reverse order.

use proptest::prelude::*;
use tidytabs::managers::history_manager::VisitedHistory;

fn arb_activations() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1..50i64, 0..200)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn history_length_is_bounded(pushes in arb_activations(), capacity in 1..64usize) {
        let mut history = VisitedHistory::new(capacity);
        for &id in &pushes {
            history.push(id);
        }
        prop_assert_eq!(history.len(), pushes.len().min(capacity));
    }

    #[test]
    fn history_head_is_last_push(pushes in arb_activations(), capacity in 1..64usize) {
        let mut history = VisitedHistory::new(capacity);
        for &id in &pushes {
            history.push(id);
        }
        prop_assert_eq!(history.head(), pushes.last().copied());
    }

    #[test]
    fn history_is_most_recent_first(pushes in arb_activations(), capacity in 1..64usize) {
        let mut history = VisitedHistory::new(capacity);
        for &id in &pushes {
            history.push(id);
        }
        let expected: Vec<i64> = pushes.iter().rev().take(capacity).copied().collect();
        prop_assert_eq!(history.entries(), expected);
    }
}
