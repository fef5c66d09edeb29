// TidyTabs data locations
// Linux:   $XDG_DATA_HOME/tidytabs or ~/.local/share/tidytabs
// macOS:   ~/Library/Application Support/TidyTabs
// Windows: %APPDATA%/TidyTabs

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TIDYTABS_DATA_DIR";

/// Returns the directory holding preferences and `config.json`.
///
/// `$TIDYTABS_DATA_DIR` wins when set and non-empty.
pub fn get_data_dir() -> PathBuf {
    match env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => default_data_dir(),
    }
}

#[cfg(target_os = "linux")]
fn default_data_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("tidytabs");
    }
    home_dir().join(".local").join("share").join("tidytabs")
}

#[cfg(target_os = "macos")]
fn default_data_dir() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join("TidyTabs")
}

#[cfg(target_os = "windows")]
fn default_data_dir() -> PathBuf {
    let appdata = env::var("APPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("TidyTabs")
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn default_data_dir() -> PathBuf {
    home_dir().join(".tidytabs")
}

#[cfg(not(target_os = "windows"))]
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}
