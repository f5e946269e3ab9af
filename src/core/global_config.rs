//! Global configuration management
//!
//! Reads user settings from `config.toml` in the config directory. The file
//! controls which roots the search path covers and how directory scans treat
//! symlinks and dot-folders.

use crate::infra::dirs::ArturoDirs;
use crate::infra::search_path::ScanOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for arturo
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalConfig {
    /// Search path settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Directory scan settings
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Search path configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfig {
    /// Extra roots, searched before the platform defaults
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Append the entries of `PATH` to the search path
    pub include_system_path: Option<bool>,

    /// Search the Arduino IDE folders under the home directory
    pub include_arduino_paths: Option<bool>,
}

/// Scan configuration for library and header discovery
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanConfig {
    /// Descend into symlinked directories
    pub follow_links: Option<bool>,

    /// Skip dot-folders and build directories
    pub default_excludes: Option<bool>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `GlobalConfigError::ParseError` if the config file exists but
    /// contains invalid TOML.
    pub fn load(dirs: &ArturoDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Extra search roots from the config file
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search.paths
    }

    /// Whether `PATH` entries join the search path (default: true)
    #[must_use]
    pub fn include_system_path(&self) -> bool {
        self.search.include_system_path.unwrap_or(true)
    }

    /// Whether the Arduino IDE folders join the search path (default: true)
    #[must_use]
    pub fn include_arduino_paths(&self) -> bool {
        self.search.include_arduino_paths.unwrap_or(true)
    }

    /// Scan options for model scans (default: follow links, default excludes on)
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new()
            .follow_links(self.scan.follow_links.unwrap_or(true))
            .default_excludes(self.scan.default_excludes.unwrap_or(true))
    }
}
