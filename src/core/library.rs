//! Libraries and library collections
//!
//! A library is a folder holding a `<name>.h` or `<name>.hpp` header, either
//! directly or under `src/`. Its version comes from `library.properties`, a
//! `-X.Y[.Z]` suffix on the folder name, or the synthetic version `1.0`.
//! Libraries live in `lib/` and `libraries/` folders of projects, platforms
//! and search roots; [`discover_libraries`] finds them.

use regex::Regex;
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::defaults::{
    HEADER_EXTENSIONS, LIBRARY_EXAMPLE_FOLDERS, LIBRARY_FOLDER_NAMES, LIBRARY_PROPERTIES_FILE,
    PROJECT_SOURCE_FOLDERS, SYNTHETIC_LIBRARY_VERSION,
};
use crate::core::index::LibraryMetadata;
use crate::core::keyvalue::KeyValueParser;
use crate::core::properties::Properties;
use crate::core::version::{compare_loose, major_of};
use crate::error::{LibraryError, SearchPathError};
use crate::infra::aggregators::ExtensionAggregator;
use crate::infra::filesystem::list_subdirectories;
use crate::infra::search_path::SearchPath;

fn version_suffix_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d+(\.\d+){1,2}$").ok())
        .as_ref()
}

/// `Servo-1.1.2` as `("Servo", Some("1.1.2"))`, anything else without a version
pub fn split_name_and_version(value: &str) -> (&str, Option<&str>) {
    if let Some((name, version)) = value.rsplit_once('-') {
        if version_suffix_pattern().is_some_and(|pattern| pattern.is_match(version)) {
            return (name, Some(version));
        }
    }
    (value, None)
}

/// Composite key used to index a library release
pub fn name_and_version(name: &str, version: &str) -> String {
    format!("{name}-{version}")
}

/// One release of a library
#[derive(Debug, Clone)]
pub struct Library {
    name: String,
    version: String,
    synthetic_version: bool,
    path: Option<PathBuf>,
    platform: Option<String>,
    properties: Properties,
    headers: OnceCell<Vec<PathBuf>>,
    sources: OnceCell<Vec<PathBuf>>,
}

impl Library {
    /// A library named after `dir_name`, which may carry a version suffix
    pub fn new(
        dir_name: &str,
        path: Option<PathBuf>,
        platform: Option<&str>,
    ) -> Result<Self, LibraryError> {
        if dir_name.is_empty() {
            return Err(LibraryError::EmptyName);
        }
        let (name, version) = split_name_and_version(dir_name);
        Ok(Self {
            name: name.to_string(),
            version: version.unwrap_or(SYNTHETIC_LIBRARY_VERSION).to_string(),
            synthetic_version: version.is_none(),
            path,
            platform: platform.map(ToString::to_string),
            properties: Properties::new(),
            headers: OnceCell::new(),
            sources: OnceCell::new(),
        })
    }

    /// A library known only from the library index
    pub fn from_metadata(metadata: &LibraryMetadata) -> Result<Self, LibraryError> {
        let mut library = Self::new(&metadata.name, None, None)?;
        library.name.clone_from(&metadata.name);
        library.version.clone_from(&metadata.version);
        library.synthetic_version = false;
        Ok(library)
    }

    /// Read a library folder
    ///
    /// Fails with [`LibraryError::MalformedLibrary`] when no main header is
    /// found and with [`LibraryError::MissingVersion`] when
    /// `library.properties` has no `version`.
    pub fn from_dir(dir: &Path, platform: Option<&str>) -> Result<Self, LibraryError> {
        let dir_name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or(LibraryError::EmptyName)?;
        let (base_name, _) = split_name_and_version(&dir_name);

        let source_dir = PROJECT_SOURCE_FOLDERS
            .iter()
            .map(|folder| if *folder == "." { dir.to_path_buf() } else { dir.join(folder) })
            .find(|candidate| {
                [dir_name.as_str(), base_name].iter().any(|stem| {
                    HEADER_EXTENSIONS
                        .iter()
                        .any(|ext| candidate.join(format!("{stem}.{ext}")).is_file())
                })
            })
            .ok_or_else(|| LibraryError::MalformedLibrary {
                path: dir.to_path_buf(),
            })?;

        let mut library = Self::new(&dir_name, Some(source_dir), platform)?;

        let properties_path = dir.join(LIBRARY_PROPERTIES_FILE);
        if properties_path.is_file() {
            let mut properties = Properties::new();
            KeyValueParser::new()
                .parse_file(&properties_path, &mut properties)
                .map_err(|e| LibraryError::ReadFile {
                    path: properties_path.clone(),
                    error: e.to_string(),
                })?;
            let version = properties
                .get("version")
                .cloned()
                .ok_or(LibraryError::MissingVersion {
                    path: properties_path,
                })?;
            library.version = version;
            library.synthetic_version = false;
            library.properties = properties;
        }
        Ok(library)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `name-version`
    pub fn key(&self) -> String {
        name_and_version(&self.name, &self.version)
    }

    /// True when the version was made up rather than declared
    pub fn is_synthetic_version(&self) -> bool {
        self.synthetic_version
    }

    /// Folder holding the main header; `None` for index-only libraries
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Name of the platform that bundles this library
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// Contents of `library.properties`, empty when there is none
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Every header of the library, examples excluded
    pub fn headers(&self, search: &SearchPath) -> Result<&[PathBuf], SearchPathError> {
        self.scan_once(&self.headers, search, ExtensionAggregator::headers)
    }

    /// Every source of the library, examples excluded
    pub fn sources(&self, search: &SearchPath) -> Result<&[PathBuf], SearchPathError> {
        self.scan_once(&self.sources, search, ExtensionAggregator::sources)
    }

    /// False for header-only libraries
    pub fn has_source(&self, search: &SearchPath) -> Result<bool, SearchPathError> {
        Ok(!self.sources(search)?.is_empty())
    }

    fn scan_once<'a>(
        &self,
        cell: &'a OnceCell<Vec<PathBuf>>,
        search: &SearchPath,
        aggregator: fn(crate::infra::search_path::ScanOptions) -> ExtensionAggregator,
    ) -> Result<&'a [PathBuf], SearchPathError> {
        if let Some(found) = cell.get() {
            return Ok(found);
        }
        let found = match &self.path {
            Some(path) => {
                let mut visitor = aggregator(
                    search
                        .scan_options()
                        .with_exclusions(LIBRARY_EXAMPLE_FOLDERS.iter().copied()),
                );
                search.scan_dirs(path, &mut visitor)?;
                visitor.into_results()
            }
            None => Vec::new(),
        };
        Ok(cell.get_or_init(|| found))
    }
}

impl std::fmt::Display for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Libraries by name, then by version
#[derive(Debug, Clone, Default)]
pub struct LibraryCollection {
    libraries: BTreeMap<String, BTreeMap<String, Library>>,
}

/// Serialisable summary of a library
#[derive(Debug, Clone, Serialize)]
pub struct LibrarySummary {
    pub name: String,
    pub version: String,
    pub path: Option<PathBuf>,
    pub platform: Option<String>,
}

impl LibraryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a release, replacing any with the same name and version
    pub fn insert(&mut self, library: Library) {
        self.libraries
            .entry(library.name().to_string())
            .or_default()
            .insert(library.version().to_string(), library);
    }

    /// Copy every release of `other` in, `other` winning on conflicts
    pub fn merge(&mut self, other: &Self) {
        for library in other.iter() {
            self.insert(library.clone());
        }
    }

    /// Copy `other` in, each of its names replacing every release held
    /// under that name
    pub fn overlay(&mut self, other: &Self) {
        for (name, versions) in &other.libraries {
            self.libraries.insert(name.clone(), versions.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.libraries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    pub fn get(&self, name: &str, version: &str) -> Option<&Library> {
        self.libraries.get(name)?.get(version)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    /// Every release, by name then version
    pub fn iter(&self) -> impl Iterator<Item = &Library> {
        self.libraries.values().flat_map(BTreeMap::values)
    }

    /// Releases of `name`, newest first
    pub fn versions(&self, name: &str) -> Vec<&Library> {
        let mut versions: Vec<&Library> = self
            .libraries
            .get(name)
            .map(|versions| versions.values().collect())
            .unwrap_or_default();
        versions.sort_by(|a, b| compare_loose(b.version(), a.version()));
        versions
    }

    /// Newest release of `name`
    pub fn newest(&self, name: &str) -> Option<&Library> {
        self.versions(name).into_iter().next()
    }

    /// Highest release whose major version is at least the requested one
    pub fn compatible(&self, name: &str, requested: &str) -> Option<&Library> {
        let requested_major = major_of(requested)?;
        self.versions(name)
            .into_iter()
            .find(|library| major_of(library.version()).is_some_and(|major| major >= requested_major))
    }

    /// Look up `name` or `name-version`
    pub fn find(&self, name_or_key: &str) -> Option<&Library> {
        match split_name_and_version(name_or_key) {
            (name, Some(version)) => self.get(name, version),
            (name, None) => self.newest(name),
        }
    }

    pub fn summaries(&self) -> Vec<LibrarySummary> {
        self.iter()
            .map(|library| LibrarySummary {
                name: library.name().to_string(),
                version: library.version().to_string(),
                path: library.path().map(Path::to_path_buf),
                platform: library.platform().map(ToString::to_string),
            })
            .collect()
    }
}

/// Find libraries in the `lib/` and `libraries/` folders under `root`
///
/// Folders that are not well formed libraries are still accepted when they
/// sit below one of `forced_paths`; otherwise they are skipped when
/// `continue_on_error` is set and fatal when it is not.
pub fn discover_libraries(
    root: &Path,
    forced_paths: &[PathBuf],
    continue_on_error: bool,
    platform: Option<&str>,
) -> Result<LibraryCollection, LibraryError> {
    let mut libraries = LibraryCollection::new();

    for folder in LIBRARY_FOLDER_NAMES {
        let libraries_dir = root.join(folder);
        if !libraries_dir.is_dir() {
            continue;
        }
        let entries = list_subdirectories(&libraries_dir).map_err(|e| LibraryError::ReadFile {
            path: libraries_dir.clone(),
            error: e.to_string(),
        })?;

        for (dir_name, library_dir) in entries {
            let library = match Library::from_dir(&library_dir, platform) {
                Ok(library) => library,
                Err(LibraryError::MalformedLibrary { .. })
                    if forced_paths.iter().any(|forced| library_dir.starts_with(forced)) =>
                {
                    Library::new(&dir_name, Some(library_dir), platform)?
                }
                Err(e) if continue_on_error => {
                    tracing::debug!("{} was not a well-formed library: {}", library_dir.display(), e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            tracing::debug!("Found library {} in {}", library.key(), libraries_dir.display());
            libraries.insert(library);
        }
    }

    Ok(libraries)
}
