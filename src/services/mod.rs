// TidyTabs stateless services
// Reordering math, tree snapshots and the preference tiers.

pub mod preference_store;
pub mod reorder_engine;
pub mod settings_engine;
pub mod snapshot_builder;
