//! User configuration.
//!
//! A small TOML file with kebab-case keys:
//!
//! ```toml
//! thread-mode = true
//! allow-cross-thread = false
//! skip-malformed = true
//! ```
//!
//! Every key is optional. A missing file means all defaults.

use std::path::Path;

use serde::Deserialize;

use crate::activity::Scope;
use crate::error::TraceError;
use crate::trace::{ExecutionInfo, Granularity};

mod path;

pub use path::{CONFIG_PATH_ENV, config_path};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TraceConfig {
    /// Split executions per thread instead of per process.
    #[serde(default)]
    pub thread_mode: bool,

    /// In thread mode, let traversal follow activities into sibling threads
    /// of the same process.
    #[serde(default)]
    pub allow_cross_thread: bool,

    /// Skip unparseable lines with a warning instead of failing the file.
    #[serde(default = "default_skip_malformed")]
    pub skip_malformed: bool,
}

fn default_skip_malformed() -> bool {
    true
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            thread_mode: false,
            allow_cross_thread: false,
            skip_malformed: default_skip_malformed(),
        }
    }
}

impl TraceConfig {
    /// Load from the resolved config path (see [`config_path`]).
    pub fn load(explicit: Option<&Path>) -> Result<Self, TraceError> {
        match config_path(explicit) {
            Some(path) => Self::load_from_path(&path),
            None => {
                log::debug!("No config directory available; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load a specific file; a file that does not exist gives the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, TraceError> {
        if !path.exists() {
            log::debug!("Config file {} not found; using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| TraceError::Config {
            message: format!("Failed to read config file {}: {e}", path.display()),
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| TraceError::Config {
            message: format!("Failed to parse config file {}: {e}", path.display()),
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn granularity(&self) -> Granularity {
        if self.thread_mode {
            Granularity::Thread
        } else {
            Granularity::Process
        }
    }

    /// Traversal scope for queries made from `execution`.
    pub fn scope(&self, execution: Option<&ExecutionInfo>) -> Scope {
        match execution {
            Some(execution) => {
                Scope::execution(execution.clone()).allow_cross_thread(self.allow_cross_thread)
            }
            None => Scope::unscoped(),
        }
    }
}
