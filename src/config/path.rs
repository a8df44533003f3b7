//! Config path management.
//!
//! Determines the config file location across platforms, with support for
//! an explicit override and an environment variable.

use std::path::{Path, PathBuf};

use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};

/// Environment variable naming the config file; also used by tests.
pub const CONFIG_PATH_ENV: &str = "E2ETRACE_CONFIG_PATH";

/// Get the config file path.
///
/// Priority:
/// 1. `explicit` (the CLI `--config` flag)
/// 2. `E2ETRACE_CONFIG_PATH` environment variable
/// 3. Platform-specific default location
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    // XDG on Linux and macOS, %APPDATA% on Windows.
    let strategy = choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("e2etrace").join("config.toml"))
}
