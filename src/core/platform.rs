//! Platforms, cores and variants
//!
//! A platform is one installed `hardware/<architecture>/<version>` folder of a
//! package. Everything it exposes is read lazily and cached: boards and
//! programmers from their descriptor files, cores and variants from their
//! folders, libraries from its `libraries/` folder.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::defaults::{BOARDS_FILENAME, CORES_DIR, PROGRAMMERS_FILENAME, VARIANTS_DIR};
use crate::core::board::Board;
use crate::core::index::{PlatformMetadata, ToolDependency};
use crate::core::keyvalue::{KeyValueParser, ParsedEntry};
use crate::core::library::{discover_libraries, LibraryCollection};
use crate::core::properties::{NamedProperties, OrderedMap};
use crate::core::toolchain::ToolChain;
use crate::core::package::Package;
use crate::error::{ArturoError, HardwareError, LibraryError, SearchPathError};
use crate::infra::aggregators::ExtensionAggregator;
use crate::infra::filesystem::list_subdirectories;
use crate::infra::search_path::SearchPath;

/// Identity of a platform shared with the boards it defines
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    package: String,
    metadata: PlatformMetadata,
    path: PathBuf,
}

impl PlatformInfo {
    pub fn new(package: impl Into<String>, metadata: PlatformMetadata, path: PathBuf) -> Self {
        Self {
            package: package.into(),
            metadata,
            path,
        }
    }

    /// Name of the package providing this platform
    pub fn package_name(&self) -> &str {
        &self.package
    }

    pub fn metadata(&self) -> &PlatformMetadata {
        &self.metadata
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A core or variant folder inside a platform
#[derive(Debug, Clone)]
pub struct Core {
    name: String,
    path: PathBuf,
    headers: OnceCell<Vec<PathBuf>>,
}

/// Variants share the shape of cores
pub type Variant = Core;

impl Core {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
            headers: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every header below this folder, scanned once
    pub fn headers(&self, search: &SearchPath) -> Result<&[PathBuf], SearchPathError> {
        if let Some(headers) = self.headers.get() {
            return Ok(headers);
        }
        let mut aggregator = ExtensionAggregator::headers(search.scan_options());
        search.scan_dirs(&self.path, &mut aggregator)?;
        Ok(self.headers.get_or_init(|| aggregator.into_results()))
    }
}

/// One installed platform
#[derive(Debug)]
pub struct Platform {
    info: Rc<PlatformInfo>,
    boards: OnceCell<OrderedMap<Board>>,
    programmers: OnceCell<OrderedMap<NamedProperties>>,
    cores: OnceCell<BTreeMap<String, Core>>,
    variants: OnceCell<BTreeMap<String, Variant>>,
    libraries: OnceCell<LibraryCollection>,
}

impl Platform {
    /// `hardware_root/<architecture>/<version>`
    pub fn platform_path(hardware_root: &Path, metadata: &PlatformMetadata) -> PathBuf {
        hardware_root
            .join(&metadata.architecture)
            .join(&metadata.version)
    }

    /// Open a platform that must be installed
    pub fn new(
        package: &str,
        hardware_root: &Path,
        metadata: PlatformMetadata,
    ) -> Result<Self, HardwareError> {
        let path = Self::platform_path(hardware_root, &metadata);
        if !path.is_dir() {
            tracing::debug!("{:?}", metadata);
            return Err(HardwareError::MissingPlatformDirectory {
                name: metadata.name,
                architecture: metadata.architecture,
                version: metadata.version,
                path,
            });
        }
        Ok(Self::at(package, metadata, path))
    }

    /// Open a platform if it is installed
    pub fn if_exists(package: &str, hardware_root: &Path, metadata: PlatformMetadata) -> Option<Self> {
        let path = Self::platform_path(hardware_root, &metadata);
        path.is_dir().then(|| Self::at(package, metadata, path))
    }

    fn at(package: &str, metadata: PlatformMetadata, path: PathBuf) -> Self {
        Self {
            info: Rc::new(PlatformInfo::new(package, metadata, path)),
            boards: OnceCell::new(),
            programmers: OnceCell::new(),
            cores: OnceCell::new(),
            variants: OnceCell::new(),
            libraries: OnceCell::new(),
        }
    }

    pub fn info(&self) -> &PlatformInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.metadata.name
    }

    pub fn architecture(&self) -> &str {
        &self.info.metadata.architecture
    }

    pub fn version(&self) -> &str {
        &self.info.metadata.version
    }

    pub fn path(&self) -> &Path {
        &self.info.path
    }

    pub fn metadata(&self) -> &PlatformMetadata {
        &self.info.metadata
    }

    /// Metadata lookup with the `arch` alias applied
    pub fn metadata_value(&self, key: &str) -> Option<String> {
        self.info.metadata.value(key)
    }

    /// Boards from `boards.txt` in declaration order
    ///
    /// Menu definitions are discarded and undotted keys are ignored.
    pub fn boards(&self) -> Result<&OrderedMap<Board>, ArturoError> {
        if let Some(boards) = self.boards.get() {
            return Ok(boards);
        }
        let mut parsed: OrderedMap<ParsedEntry<Board>> = OrderedMap::new();
        KeyValueParser::new().parse_file_grouped(
            &self.path().join(BOARDS_FILENAME),
            &mut parsed,
            |name| Board::new(name, Rc::clone(&self.info)),
        )?;

        let mut boards = OrderedMap::new();
        for (name, entry) in parsed {
            match entry {
                ParsedEntry::Group(board) => {
                    boards.insert(name, board);
                }
                ParsedEntry::Value(value) => {
                    tracing::debug!("Ignoring top-level {}={} in {}", name, value, BOARDS_FILENAME);
                }
            }
        }
        Ok(self.boards.get_or_init(|| boards))
    }

    pub fn board(&self, name: &str) -> Result<&Board, ArturoError> {
        self.boards()?.get(name).ok_or_else(|| {
            HardwareError::BoardNotFound {
                platform: self.name().to_string(),
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Programmers from `programmers.txt`; a platform without one has none
    pub fn programmers(&self) -> Result<&OrderedMap<NamedProperties>, ArturoError> {
        if let Some(programmers) = self.programmers.get() {
            return Ok(programmers);
        }
        let path = self.path().join(PROGRAMMERS_FILENAME);
        let mut programmers = OrderedMap::new();
        if path.is_file() {
            let mut parsed: OrderedMap<ParsedEntry<NamedProperties>> = OrderedMap::new();
            KeyValueParser::new().parse_file_grouped(&path, &mut parsed, |name| {
                NamedProperties::new(name)
            })?;
            for (name, entry) in parsed {
                if let ParsedEntry::Group(programmer) = entry {
                    programmers.insert(name, programmer);
                }
            }
        }
        Ok(self.programmers.get_or_init(|| programmers))
    }

    pub fn cores(&self) -> Result<&BTreeMap<String, Core>, HardwareError> {
        if let Some(cores) = self.cores.get() {
            return Ok(cores);
        }
        let cores = self.list_folder(CORES_DIR)?;
        Ok(self.cores.get_or_init(|| cores))
    }

    pub fn variants(&self) -> Result<&BTreeMap<String, Variant>, HardwareError> {
        if let Some(variants) = self.variants.get() {
            return Ok(variants);
        }
        let variants = self.list_folder(VARIANTS_DIR)?;
        Ok(self.variants.get_or_init(|| variants))
    }

    /// The core named by the board's `build.core`
    pub fn core_for(&self, board: &Board) -> Result<&Core, HardwareError> {
        let name = board.core_name().ok_or_else(|| HardwareError::MissingCore {
            board: board.name().to_string(),
        })?;
        self.cores()?
            .get(name)
            .ok_or_else(|| HardwareError::CoreNotFound {
                platform: self.name().to_string(),
                name: name.to_string(),
            })
    }

    /// The variant named by the board's `build.variant`, if it declares one
    pub fn variant_for(&self, board: &Board) -> Result<Option<&Variant>, HardwareError> {
        let Some(name) = board.variant_name() else {
            tracing::debug!("Board {} does not have a variant.", board.name());
            return Ok(None);
        };
        self.variants()?
            .get(name)
            .map(Some)
            .ok_or_else(|| HardwareError::VariantNotFound {
                platform: self.name().to_string(),
                name: name.to_string(),
            })
    }

    /// Libraries bundled with the platform, tagged with its name
    pub fn libraries(&self) -> Result<&LibraryCollection, LibraryError> {
        if let Some(libraries) = self.libraries.get() {
            return Ok(libraries);
        }
        let libraries = discover_libraries(self.path(), &[], true, Some(self.name()))?;
        Ok(self.libraries.get_or_init(|| libraries))
    }

    pub fn tool_dependencies(&self) -> &[ToolDependency] {
        &self.info.metadata.tools_dependencies
    }

    /// Toolchains this platform depends on, looked up in their packages
    pub fn toolchains<'p>(
        &self,
        packages: &'p OrderedMap<Package>,
    ) -> Result<Vec<&'p ToolChain>, HardwareError> {
        self.tool_dependencies()
            .iter()
            .map(|dependency| {
                packages
                    .get(&dependency.packager)
                    .ok_or_else(|| HardwareError::PackageNotFound {
                        name: dependency.packager.clone(),
                    })?
                    .toolchain(&dependency.name, &dependency.version)
            })
            .collect()
    }

    fn list_folder(&self, folder: &str) -> Result<BTreeMap<String, Core>, HardwareError> {
        let dir = self.path().join(folder);
        let entries = list_subdirectories(&dir).map_err(|e| HardwareError::ReadDir {
            path: dir.clone(),
            error: e.to_string(),
        })?;
        Ok(entries
            .into_iter()
            .map(|(name, path)| (name.clone(), Core::new(name, path)))
            .collect())
    }
}
