// TidyTabs state managers
// Managers own state that outlives a single call: visited history, in-flight
// batches and the debounce slot.

pub mod batch_manager;
pub mod change_notifier;
pub mod history_manager;
