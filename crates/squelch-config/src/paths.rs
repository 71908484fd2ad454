//! Platform-specific locations for settings, banks and parameter states.
//!
//! - **Config**: `~/.config/squelch/` (Linux), `~/Library/Application Support/squelch/` (macOS), `%APPDATA%\squelch\` (Windows)
//! - **Patterns**: `<config>/patterns/`
//! - **States**: `<config>/states/`

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Application name used for directory paths.
const APP_NAME: &str = "squelch";

/// Subdirectory name for pattern banks.
const PATTERNS_SUBDIR: &str = "patterns";

/// Subdirectory name for parameter states.
const STATES_SUBDIR: &str = "states";

/// File name of the engine settings.
const SETTINGS_FILE: &str = "settings.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the directory pattern banks are stored in.
pub fn user_patterns_dir() -> PathBuf {
    user_config_dir().join(PATTERNS_SUBDIR)
}

/// Returns the directory parameter states are stored in.
pub fn user_states_dir() -> PathBuf {
    user_config_dir().join(STATES_SUBDIR)
}

/// Returns the default settings file path.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    if !path.exists() {
        std::fs::create_dir_all(&path).map_err(|e| ConfigError::create_dir(&path, e))?;
    }
    Ok(path)
}

/// Ensures the user config directory exists, creating it if needed.
pub fn ensure_user_config_dir() -> Result<PathBuf> {
    ensure_dir(user_config_dir())
}

/// Ensures the patterns directory exists, creating it if needed.
pub fn ensure_user_patterns_dir() -> Result<PathBuf> {
    ensure_dir(user_patterns_dir())
}

/// Ensures the states directory exists, creating it if needed.
pub fn ensure_user_states_dir() -> Result<PathBuf> {
    ensure_dir(user_states_dir())
}
