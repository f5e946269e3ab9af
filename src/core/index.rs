//! Package and library index documents
//!
//! `package_index.json` describes every installable package, its platforms and
//! its toolchains; `library_index.json` lists known libraries. Only the fields
//! the model reads are typed, everything else is kept in `extra` so metadata
//! lookups can still reach it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::HardwareError;

/// Top level of `package_index.json`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PackageIndex {
    #[serde(default)]
    pub packages: Vec<PackageMetadata>,
}

/// One vendor package
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PackageMetadata {
    pub name: String,
    #[serde(default)]
    pub maintainer: Option<String>,
    #[serde(default)]
    pub platforms: Vec<PlatformMetadata>,
    #[serde(default)]
    pub tools: Vec<ToolChainMetadata>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One platform release inside a package
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlatformMetadata {
    pub name: String,
    pub architecture: String,
    pub version: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "toolsDependencies", default)]
    pub tools_dependencies: Vec<ToolDependency>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Reference from a platform to a toolchain release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToolDependency {
    pub packager: String,
    pub name: String,
    pub version: String,
}

/// One toolchain release inside a package
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolChainMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub systems: Vec<HostSystem>,
}

/// Download of a toolchain for one host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostSystem {
    pub host: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "archiveFileName", default, skip_serializing_if = "Option::is_none")]
    pub archive_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Top level of `library_index.json`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibraryIndex {
    #[serde(default)]
    pub libraries: Vec<LibraryMetadata>,
}

/// One library release listed in the library index
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibraryMetadata {
    pub name: String,
    pub version: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PackageIndex {
    pub fn load(path: &Path) -> Result<Self, HardwareError> {
        load_json(path)
    }
}

impl LibraryIndex {
    pub fn load(path: &Path) -> Result<Self, HardwareError> {
        load_json(path)
    }
}

impl PlatformMetadata {
    /// Metadata field as a string, as seen by macro expansion
    ///
    /// `arch` is an alias for the upper-cased architecture.
    pub fn value(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.name.clone()),
            "architecture" => Some(self.architecture.clone()),
            "arch" => Some(self.architecture.to_uppercase()),
            "version" => Some(self.version.clone()),
            "url" => self.url.clone(),
            _ => self.extra.get(key).and_then(scalar_to_string),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, HardwareError> {
    let content = std::fs::read_to_string(path).map_err(|e| HardwareError::IndexParse {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| HardwareError::IndexParse {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}
