// TidyTabs shared type definitions
// Each submodule defines types used across the coordinator.

pub mod errors;
pub mod event;
pub mod message;
pub mod settings;
pub mod tab;
