//! TidyTabs: background coordinator of a tab and window manager.
//!
//! This library crate exposes all modules for use by the gateway binary and
//! the integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
