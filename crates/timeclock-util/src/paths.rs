//! Default paths for timeclock components
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/timeclock/config.toml` or `~/.config/timeclock/config.toml`
//! - Data: `$XDG_DATA_HOME/timeclock` or `~/.local/share/timeclock`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const TIMECLOCK_CONFIG_ENV: &str = "TIMECLOCK_CONFIG";

/// Environment variable for overriding the data directory
pub const TIMECLOCK_DATA_DIR_ENV: &str = "TIMECLOCK_DATA_DIR";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "attendance.db";

/// Application subdirectory name
const APP_DIR: &str = "timeclock";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/timeclock/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/timeclock/config.toml` (fallback)
///
/// `TIMECLOCK_CONFIG` is handled by the CLI flag, not here.
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$XDG_DATA_HOME/timeclock` (if XDG_DATA_HOME is set)
/// 2. `~/.local/share/timeclock` (fallback)
///
/// `TIMECLOCK_DATA_DIR` is handled by the CLI flag, not here.
pub fn default_data_dir() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}
