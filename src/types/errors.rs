use thiserror::Error;

use super::tab::{TabId, WindowId};

// === PlatformError ===

/// Failure reported by a single tab/window platform call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlatformError {
    /// Tab with the given ID was not found.
    #[error("No tab with id: {0}")]
    TabNotFound(TabId),
    /// Window with the given ID was not found.
    #[error("No window with id: {0}")]
    WindowNotFound(WindowId),
    /// The platform refused the request.
    #[error("Platform rejected request: {0}")]
    Rejected(String),
    /// The platform's event stream went away before the call was confirmed.
    #[error("Platform event stream closed")]
    Disconnected,
    /// The task driving the call panicked or was cancelled.
    #[error("Platform task failed: {0}")]
    TaskFailed(String),
}

// === PrefsError ===

/// Errors related to the preference store and coordinator configuration.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// An I/O error occurred while reading or writing preferences.
    #[error("Preferences I/O error: {0}")]
    Io(String),
    /// Failed to serialize or deserialize preferences.
    #[error("Preferences serialization error: {0}")]
    Serialization(String),
    /// The provided preference key is invalid.
    #[error("Invalid preference key: {0}")]
    InvalidKey(String),
    /// The provided preference value is invalid.
    #[error("Invalid preference value: {0}")]
    InvalidValue(String),
    /// The local tier's database failed.
    #[error("Preferences database error: {0}")]
    Database(#[from] rusqlite::Error),
}

// === CoordinatorError ===

/// Errors surfaced by coordinator commands and the messaging gateway.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Prefs(#[from] PrefsError),
    /// The incoming message could not be understood.
    #[error("Malformed message: {0}")]
    Protocol(String),
}
