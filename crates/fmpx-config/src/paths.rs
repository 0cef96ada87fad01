//! Platform-specific configuration paths.
//!
//! - **User config**: `~/.config/fmpx/` (Linux), `~/Library/Application Support/fmpx/` (macOS), `%APPDATA%\fmpx\` (Windows)
//! - **Station file**: `station.toml` inside the user config directory

use crate::ConfigError;
use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "fmpx";

/// File name of the station configuration.
pub const STATION_FILE: &str = "station.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the station configuration file.
pub fn default_station_path() -> PathBuf {
    user_config_dir().join(STATION_FILE)
}

/// Ensure the user config directory exists.
///
/// Creates the directory and any parent directories if they don't exist.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}
