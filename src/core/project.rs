//! Projects and build configurations
//!
//! A [`Project`] is a sketch folder. A [`Configuration`] targets a project at
//! one board of one platform and caches everything a build needs: the
//! project's headers and sources, the merged library collection and the
//! expanded board build info. [`BuildManifest`] is the serialisable view of a
//! configuration handed to whatever renders the build files.

use serde::Serialize;
use std::cell::OnceCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::defaults::{BUILD_DIR_NAME, LIBRARY_FOLDER_NAMES, SOURCE_EXTENSIONS};
use crate::core::board::Board;
use crate::core::dependencies::LibraryResolver;
use crate::core::environment::Environment;
use crate::core::library::{Library, LibraryCollection};
use crate::core::package::Package;
use crate::core::platform::Platform;
use crate::core::properties::{OrderedMap, Properties};
use crate::core::resolver::MacroResolver;
use crate::error::{ArturoError, SearchPathError};
use crate::infra::aggregators::{ExtensionAggregator, PackageAggregator, PackageRoot};
use crate::infra::search_path::SearchPath;

/// A sketch folder
#[derive(Debug)]
pub struct Project {
    name: String,
    path: PathBuf,
    libraries: OnceCell<LibraryCollection>,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            libraries: OnceCell::new(),
        }
    }

    /// The project rooted at `dir`, named after it
    pub fn infer(dir: &Path) -> Self {
        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(name, dir)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn build_dir(&self) -> PathBuf {
        self.path.join(BUILD_DIR_NAME)
    }

    /// Sketch folders (`sketch/sketch.ino`) outside library folders, plus any
    /// of `forced` that exist under the project
    ///
    /// Forced folders are reported with an empty file name.
    pub fn source_roots(
        &self,
        search: &SearchPath,
        forced: &[&str],
    ) -> Result<Vec<PackageRoot>, SearchPathError> {
        let mut visitor = PackageAggregator::new(
            SOURCE_EXTENSIONS,
            search
                .scan_options()
                .with_exclusions(LIBRARY_FOLDER_NAMES.iter().copied()),
        )
        .excluding_parents(LIBRARY_FOLDER_NAMES);
        search.scan_dirs(&self.path, &mut visitor)?;
        let mut roots = visitor.into_results();

        for folder in forced {
            if self.path.join(folder).is_dir() {
                roots.push(PackageRoot {
                    parent_path: self.path.clone(),
                    package_name: (*folder).to_string(),
                    file_name: String::new(),
                });
            }
        }
        Ok(roots)
    }

    /// Libraries in the project's `lib/` and `libraries/` folders
    ///
    /// Every folder in there counts as a library, well formed or not.
    pub fn libraries(&self, env: &Environment) -> Result<&LibraryCollection, ArturoError> {
        if let Some(libraries) = self.libraries.get() {
            return Ok(libraries);
        }
        let forced: Vec<PathBuf> = LIBRARY_FOLDER_NAMES
            .iter()
            .map(|folder| self.path.join(folder))
            .collect();
        let libraries = env.libraries_for(&self.path, &forced, false, None)?;
        Ok(self.libraries.get_or_init(|| libraries))
    }
}

/// A project targeted at one board
pub struct Configuration<'e> {
    environment: &'e Environment,
    project: &'e Project,
    package_name: String,
    platform_name: String,
    board_name: String,
    source_path: PathBuf,
    headers: OnceCell<Vec<PathBuf>>,
    header_dirs: OnceCell<Vec<PathBuf>>,
    sources: OnceCell<Vec<PathBuf>>,
    libraries: OnceCell<LibraryCollection>,
}

impl<'e> Configuration<'e> {
    /// `source_root` is relative to the project folder
    pub fn new(
        environment: &'e Environment,
        project: &'e Project,
        package_name: impl Into<String>,
        platform_name: impl Into<String>,
        board_name: impl Into<String>,
        source_root: impl AsRef<Path>,
    ) -> Self {
        let source_root = source_root.as_ref();
        let source_path = if source_root == Path::new(".") {
            project.path().to_path_buf()
        } else {
            project.path().join(source_root)
        };
        Self {
            environment,
            project,
            package_name: package_name.into(),
            platform_name: platform_name.into(),
            board_name: board_name.into(),
            source_path,
            headers: OnceCell::new(),
            header_dirs: OnceCell::new(),
            sources: OnceCell::new(),
            libraries: OnceCell::new(),
        }
    }

    pub fn environment(&self) -> &'e Environment {
        self.environment
    }

    pub fn project(&self) -> &'e Project {
        self.project
    }

    pub fn package(&self) -> Result<&'e Package, ArturoError> {
        self.environment.package(&self.package_name)
    }

    pub fn platform(&self) -> Result<&'e Platform, ArturoError> {
        Ok(self.package()?.platform(&self.platform_name)?)
    }

    pub fn board(&self) -> Result<&'e Board, ArturoError> {
        self.platform()?.board(&self.board_name)
    }

    /// Per-board folder inside the project build directory
    pub fn build_dir(&self) -> PathBuf {
        self.project.build_dir().join(&self.board_name)
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Headers under the source path, library folders excluded
    pub fn headers(&self) -> Result<&[PathBuf], SearchPathError> {
        if let Some(headers) = self.headers.get() {
            return Ok(headers);
        }
        let headers = self.scan(ExtensionAggregator::headers)?;
        Ok(self.headers.get_or_init(|| headers))
    }

    /// Distinct folders holding [`Self::headers`], in first-seen order
    pub fn header_dirs(&self) -> Result<&[PathBuf], SearchPathError> {
        if let Some(dirs) = self.header_dirs.get() {
            return Ok(dirs);
        }
        let mut seen = HashSet::new();
        let dirs: Vec<PathBuf> = self
            .headers()?
            .iter()
            .filter_map(|header| header.parent())
            .filter(|dir| seen.insert(dir.to_path_buf()))
            .map(Path::to_path_buf)
            .collect();
        Ok(self.header_dirs.get_or_init(|| dirs))
    }

    /// Sources under the source path, library folders excluded
    pub fn sources(&self) -> Result<&[PathBuf], SearchPathError> {
        if let Some(sources) = self.sources.get() {
            return Ok(sources);
        }
        let sources = self.scan(ExtensionAggregator::sources)?;
        Ok(self.sources.get_or_init(|| sources))
    }

    /// Environment, platform and project libraries
    ///
    /// A name found in a later layer hides every release of that name in
    /// the earlier ones.
    pub fn libraries(&self) -> Result<&LibraryCollection, ArturoError> {
        if let Some(libraries) = self.libraries.get() {
            return Ok(libraries);
        }
        let mut libraries = self.environment.libraries()?.clone();
        libraries.overlay(self.platform()?.libraries()?);
        libraries.overlay(self.project.libraries(self.environment)?);
        Ok(self.libraries.get_or_init(|| libraries))
    }

    /// Sources followed by headers
    pub fn project_files(&self) -> Result<Vec<PathBuf>, SearchPathError> {
        Ok(self
            .sources()?
            .iter()
            .chain(self.headers()?)
            .cloned()
            .collect())
    }

    /// Resolver over this configuration's libraries
    pub fn library_resolver(&self) -> Result<LibraryResolver<'_>, ArturoError> {
        Ok(LibraryResolver::new(
            self.libraries()?,
            self.environment.search_path(),
        )?)
    }

    /// Libraries with sources that the project needs, transitively
    pub fn resolve_libraries(&self) -> Result<OrderedMap<&Library>, ArturoError> {
        self.library_resolver()?.libs_for_files(&self.project_files()?)
    }

    /// Everything a build file renderer needs for this configuration
    pub fn build_manifest(
        &self,
        fallback: Option<&dyn MacroResolver>,
        elide_on_miss: bool,
    ) -> Result<BuildManifest, ArturoError> {
        let platform = self.platform()?;
        let board = self.board()?;
        let search = self.environment.search_path();

        let core = platform.core_for(board)?;
        let variant = platform.variant_for(board)?;

        Ok(BuildManifest {
            project: self.project.name().to_string(),
            package: self.package_name.clone(),
            platform: self.platform_name.clone(),
            board: self.board_name.clone(),
            build_dir: self.build_dir(),
            core: core.path().to_path_buf(),
            core_headers: core.headers(search)?.to_vec(),
            variant: variant.map(|variant| variant.path().to_path_buf()),
            build_info: board.process_build_info(fallback, elide_on_miss)?,
            headers: self.headers()?.to_vec(),
            header_dirs: self.header_dirs()?.to_vec(),
            sources: self.sources()?.to_vec(),
            libraries: self.resolve_libraries()?.keys().map(ToString::to_string).collect(),
        })
    }

    fn scan(
        &self,
        aggregator: fn(crate::infra::search_path::ScanOptions) -> ExtensionAggregator,
    ) -> Result<Vec<PathBuf>, SearchPathError> {
        let search = self.environment.search_path();
        let mut visitor = aggregator(
            search
                .scan_options()
                .with_exclusions(LIBRARY_FOLDER_NAMES.iter().copied()),
        );
        search.scan_dirs(&self.source_path, &mut visitor)?;
        Ok(visitor.into_results())
    }
}

/// Resolved build inputs for one configuration
#[derive(Debug, Clone, Serialize)]
pub struct BuildManifest {
    pub project: String,
    pub package: String,
    pub platform: String,
    pub board: String,
    pub build_dir: PathBuf,
    pub core: PathBuf,
    pub core_headers: Vec<PathBuf>,
    pub variant: Option<PathBuf>,
    /// Expanded board build info in declaration order
    pub build_info: Properties,
    pub headers: Vec<PathBuf>,
    pub header_dirs: Vec<PathBuf>,
    pub sources: Vec<PathBuf>,
    /// `name-version` of every library the sources need
    pub libraries: Vec<String>,
}
