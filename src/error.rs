//! Error types for arturo
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Search path and directory scan errors
#[derive(Error, Debug)]
pub enum SearchPathError {
    /// None of the candidate file names exist on the search path
    #[error("Missing required {generic_name}: looked in {searched:?} for {file_names:?}")]
    MissingRequiredFile {
        generic_name: String,
        file_names: Vec<String>,
        searched: Vec<PathBuf>,
    },

    /// A directory could not be listed during a scan
    #[error("Failed to read directory '{path}': {error}")]
    ReadDir { path: PathBuf, error: String },
}

/// Key/value file errors
#[derive(Error, Debug)]
pub enum KeyValueError {
    /// A non-blank, non-comment line without an `=`
    #[error("Malformed key=value pair in {path}:{line_number}: {line}")]
    MalformedLine {
        path: PathBuf,
        line_number: usize,
        line: String,
    },

    /// The file could not be read
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Package, platform, board and toolchain errors
#[derive(Error, Debug)]
pub enum HardwareError {
    /// Package directory absent on disk
    #[error("Package directory not found: {path}")]
    MissingPackageDirectory { path: PathBuf },

    /// Platform directory absent on disk
    #[error("Platform '{name}' ({architecture} version {version}) not found at {path}")]
    MissingPlatformDirectory {
        name: String,
        architecture: String,
        version: String,
        path: PathBuf,
    },

    /// Package not present in the package index
    #[error("Package '{name}' not found")]
    PackageNotFound { name: String },

    /// Platform not installed for a package
    #[error("Platform '{name}' not found in package '{package}'")]
    PlatformNotFound { package: String, name: String },

    /// Board not defined by a platform
    #[error("Board '{name}' not found in platform '{platform}'")]
    BoardNotFound { platform: String, name: String },

    /// Core folder missing for a board
    #[error("Core '{name}' not found in platform '{platform}'")]
    CoreNotFound { platform: String, name: String },

    /// Variant folder missing for a board
    #[error("Variant '{name}' not found in platform '{platform}'")]
    VariantNotFound { platform: String, name: String },

    /// Board declares no `build.core`
    #[error("Board '{board}' does not declare build.core")]
    MissingCore { board: String },

    /// Toolchain not declared by a package
    #[error("Toolchain '{name}' version '{version}' not found in package '{packager}'")]
    ToolChainNotFound {
        packager: String,
        name: String,
        version: String,
    },

    /// A `name-version` toolchain key without a hyphen
    #[error("'{value}' is not a hyphenated name-version string")]
    NotNameAndVersion { value: String },

    /// JSON index could not be read or parsed
    #[error("Failed to parse index '{path}': {error}")]
    IndexParse { path: PathBuf, error: String },

    /// A directory could not be listed
    #[error("Failed to read directory '{path}': {error}")]
    ReadDir { path: PathBuf, error: String },
}

/// Library discovery and dependency resolution errors
#[derive(Error, Debug)]
pub enum LibraryError {
    /// A source requires a library version absent from the environment
    #[error("{source_file} depends on version {} of {name} which was not found in the current environment", .version.as_deref().unwrap_or("(any)"))]
    UnresolvedLibraryDependency {
        source_file: PathBuf,
        name: String,
        version: Option<String>,
    },

    /// Two include sites imply different versions of one library
    #[error("Two different versions of {name} found when scanning headers: {first} and {second} ({source_file})")]
    AmbiguousLibraryVersion {
        name: String,
        first: String,
        second: String,
        source_file: PathBuf,
    },

    /// Directory has no `<name>.h` or `<name>.hpp` header
    #[error("{path} is not a well formed library")]
    MalformedLibrary { path: PathBuf },

    /// `library.properties` without a `version` field
    #[error("{path} does not declare a version")]
    MissingVersion { path: PathBuf },

    /// A built-in include pattern failed to compile
    #[error("Invalid include pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },

    /// Empty library name
    #[error("Library name cannot be empty or missing")]
    EmptyName,

    /// Source file could not be read
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Top-level arturo error type
#[derive(Error, Debug)]
pub enum ArturoError {
    /// Search path error
    #[error("Search path error: {0}")]
    SearchPath(#[from] SearchPathError),

    /// Key/value file error
    #[error("Key/value error: {0}")]
    KeyValue(#[from] KeyValueError),

    /// Hardware model error
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// Library error
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// Global configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::global_config::GlobalConfigError),

    /// Generic error
    #[error("{0}")]
    Generic(String),
}

/// Result alias used throughout the hardware model
pub type Result<T, E = ArturoError> = std::result::Result<T, E>;
