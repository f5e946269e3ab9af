//! Platform-specific directory management
//!
//! Provides the config directory and the conventional Arduino installation
//! roots that seed the search path.
//!
//! Environment variables can override defaults:
//! - `ARTURO_CONFIG_DIR` - Override config directory
//! - `ARTURO_SEARCH_PATH` - Extra search roots, in platform path-list syntax

use std::env;
use std::path::{Path, PathBuf};

use crate::config::defaults::LIB_NAME;

/// Environment variable names for directory overrides
pub const ENV_CONFIG_DIR: &str = "ARTURO_CONFIG_DIR";
pub const ENV_SEARCH_PATH: &str = "ARTURO_SEARCH_PATH";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Platform-specific directory provider
#[derive(Debug, Clone)]
pub struct ArturoDirs {
    config_dir: PathBuf,
    home_dir: Option<PathBuf>,
    env_search_paths: Vec<PathBuf>,
}

impl ArturoDirs {
    /// Create a new `ArturoDirs` instance
    ///
    /// Checks environment variables first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
            home_dir: dirs::home_dir(),
            env_search_paths: env::var_os(ENV_SEARCH_PATH)
                .map(|value| env::split_paths(&value).collect())
                .unwrap_or_default(),
        }
    }

    /// Directories rooted somewhere other than the user's home, without
    /// consulting the environment
    #[must_use]
    pub fn with_home(config_dir: PathBuf, home_dir: Option<PathBuf>) -> Self {
        Self {
            config_dir,
            home_dir,
            env_search_paths: Vec::new(),
        }
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/arturo` or `~/.config/arturo`
    /// - macOS: `~/Library/Application Support/arturo`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Path to `config.toml` in the config directory
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Roots named by `ARTURO_SEARCH_PATH`
    #[must_use]
    pub fn env_search_paths(&self) -> &[PathBuf] {
        &self.env_search_paths
    }

    /// Conventional Arduino IDE and sketchbook locations under the home directory
    ///
    /// Returned whether or not they exist; the search path skips absent roots
    /// naturally.
    #[must_use]
    pub fn arduino15_roots(&self) -> Vec<PathBuf> {
        let Some(home) = self.home_dir.as_deref() else {
            return Vec::new();
        };
        [
            home.join("Library").join("Arduino15"),
            home.join(".arduino15"),
            home.join("Documents").join("Arduino"),
            home.join("Arduino"),
        ]
        .into_iter()
        .collect()
    }

    /// Entries of the `PATH` environment variable
    #[must_use]
    pub fn system_paths() -> Vec<PathBuf> {
        env::var_os("PATH")
            .map(|value| env::split_paths(&value).collect())
            .unwrap_or_default()
    }

    /// Resolve config directory from environment or platform default
    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        Self::platform_config_dir()
    }

    /// Get platform-specific config directory
    fn platform_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(LIB_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(LIB_NAME))
                    .unwrap_or_else(|| Path::new(".").join(".config").join(LIB_NAME))
            })
    }
}

impl Default for ArturoDirs {
    fn default() -> Self {
        Self::new()
    }
}
