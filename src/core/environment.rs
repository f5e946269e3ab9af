//! The installed Arduino environment
//!
//! An [`Environment`] ties a [`SearchPath`] to the package index found on it,
//! the packages installed beside that index, every library reachable from
//! the search roots and the user's preferences. Everything is loaded lazily
//! and at most once per instance.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use crate::config::defaults::{LIBRARY_INDEX_NAMES, PACKAGES_DIR, PACKAGE_INDEX_NAMES};
use crate::core::global_config::GlobalConfig;
use crate::core::index::{LibraryIndex, PackageIndex};
use crate::core::library::{discover_libraries, Library, LibraryCollection};
use crate::core::package::Package;
use crate::core::preferences::Preferences;
use crate::core::properties::OrderedMap;
use crate::error::{ArturoError, HardwareError, LibraryError};
use crate::infra::dirs::ArturoDirs;
use crate::infra::search_path::SearchPath;

#[derive(Debug)]
pub struct Environment {
    search_path: SearchPath,
    package_index_path: OnceCell<PathBuf>,
    package_index: OnceCell<PackageIndex>,
    packages: OnceCell<OrderedMap<Package>>,
    libraries: OnceCell<LibraryCollection>,
    preferences: Preferences,
}

impl Environment {
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            preferences: Preferences::new(search_path.clone()),
            search_path,
            package_index_path: OnceCell::new(),
            package_index: OnceCell::new(),
            packages: OnceCell::new(),
            libraries: OnceCell::new(),
        }
    }

    /// Build the search path from user configuration
    ///
    /// Roots are searched in this order: `search.paths` from the config
    /// file, `ARTURO_SEARCH_PATH`, the conventional Arduino folders under the
    /// home directory, then `PATH`. The last two can be switched off.
    pub fn from_config(config: &GlobalConfig, dirs: &ArturoDirs) -> Self {
        let mut roots: Vec<PathBuf> = config.search_paths().to_vec();
        roots.extend(dirs.env_search_paths().iter().cloned());
        if config.include_arduino_paths() {
            roots.extend(dirs.arduino15_roots());
        }
        if config.include_system_path() {
            roots.extend(ArturoDirs::system_paths());
        }
        tracing::debug!("Search path: {:?}", roots);
        Self::new(SearchPath::new(roots).with_scan_defaults(config.scan_options()))
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// The first `package_index.json` on the search path
    pub fn package_index_path(&self) -> Result<&Path, ArturoError> {
        if let Some(path) = self.package_index_path.get() {
            return Ok(path);
        }
        let path = self
            .search_path
            .find_first_file_of_name_or_throw(PACKAGE_INDEX_NAMES, "package index")?;
        Ok(self.package_index_path.get_or_init(|| path))
    }

    /// `packages` folder beside the package index
    pub fn package_root(&self) -> Result<PathBuf, ArturoError> {
        let index_path = self.package_index_path()?;
        let index_dir = index_path.parent().unwrap_or_else(|| Path::new("."));
        Ok(index_dir.join(PACKAGES_DIR))
    }

    pub fn package_index(&self) -> Result<&PackageIndex, ArturoError> {
        if let Some(index) = self.package_index.get() {
            return Ok(index);
        }
        let index = PackageIndex::load(self.package_index_path()?)?;
        Ok(self.package_index.get_or_init(|| index))
    }

    /// Packages declared by the index, keyed by name
    ///
    /// Every declared package must be present on disk.
    pub fn packages(&self) -> Result<&OrderedMap<Package>, ArturoError> {
        if let Some(packages) = self.packages.get() {
            return Ok(packages);
        }
        let root = self.package_root()?;
        let mut packages = OrderedMap::new();
        for metadata in &self.package_index()?.packages {
            let package = Package::new(&root, metadata.clone())?;
            packages.insert(package.name().to_string(), package);
        }
        Ok(self.packages.get_or_init(|| packages))
    }

    pub fn package(&self, name: &str) -> Result<&Package, ArturoError> {
        self.packages()?.get(name).ok_or_else(|| {
            HardwareError::PackageNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Libraries from the library index plus every library folder under
    /// each search root
    ///
    /// A library installed on disk hides every index release of the same
    /// name. Malformed library folders are skipped.
    pub fn libraries(&self) -> Result<&LibraryCollection, ArturoError> {
        if let Some(libraries) = self.libraries.get() {
            return Ok(libraries);
        }
        let mut libraries = LibraryCollection::new();
        if let Some(index_path) = LIBRARY_INDEX_NAMES
            .iter()
            .find_map(|name| self.search_path.find_file(name))
        {
            for metadata in LibraryIndex::load(&index_path)?.libraries {
                libraries.insert(Library::from_metadata(&metadata)?);
            }
        }
        let mut installed = LibraryCollection::new();
        for root in self.search_path.roots() {
            installed.merge(&self.libraries_for(root, &[], true, None)?);
        }
        libraries.overlay(&installed);
        Ok(self.libraries.get_or_init(|| libraries))
    }

    /// Libraries in the `lib/` and `libraries/` folders under `path`
    pub fn libraries_for(
        &self,
        path: &Path,
        forced_paths: &[PathBuf],
        continue_on_error: bool,
        platform: Option<&str>,
    ) -> Result<LibraryCollection, LibraryError> {
        discover_libraries(path, forced_paths, continue_on_error, platform)
    }
}
