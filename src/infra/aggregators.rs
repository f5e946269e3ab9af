//! Visitors that collect files during a directory scan
//!
//! - [`ExtensionAggregator`] collects every `name.ext` file whose extension is
//!   in a fixed set (headers, sources).
//! - [`PackageAggregator`] collects Arduino15 "packages": files shaped as
//!   `folder/folder.ext`, which mark sketch roots (`sketch/sketch.ino`) and
//!   header-defined libraries (`Servo/Servo.h`) alike.

use std::path::PathBuf;

use crate::config::defaults::{HEADER_EXTENSIONS, SOURCE_EXTENSIONS};
use crate::infra::search_path::{
    FileVisit, ResultSet, ScanControl, ScanOptions, ScanResult, SearchVisitor, VisitorState,
};

/// Split `name.ext` into its two parts, rejecting any other shape
fn split_two_part_name(file_name: &str) -> Option<(&str, &str)> {
    let mut parts = file_name.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(stem), Some(ext), None) => Some((stem, ext)),
        _ => None,
    }
}

/// Collects the full path of every file with a matching extension
#[derive(Debug)]
pub struct ExtensionAggregator {
    state: VisitorState,
    extensions: &'static [&'static str],
    results: ResultSet<PathBuf>,
}

impl ExtensionAggregator {
    pub fn new(extensions: &'static [&'static str], options: ScanOptions) -> Self {
        Self {
            state: VisitorState::new(options),
            extensions,
            results: ResultSet::new(),
        }
    }

    /// Collects `.h` and `.hpp` files
    pub fn headers(options: ScanOptions) -> Self {
        Self::new(HEADER_EXTENSIONS, options)
    }

    /// Collects `.cpp`, `.c` and `.ino` files
    pub fn sources(options: ScanOptions) -> Self {
        Self::new(SOURCE_EXTENSIONS, options)
    }

    pub fn results(&self) -> &ResultSet<PathBuf> {
        &self.results
    }

    pub fn into_results(self) -> Vec<PathBuf> {
        self.results.into_vec()
    }
}

impl SearchVisitor for ExtensionAggregator {
    fn state(&self) -> &VisitorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut VisitorState {
        &mut self.state
    }

    fn on_visit_file(&mut self, visit: &FileVisit<'_>) -> ScanControl {
        if let Some((_, ext)) = split_two_part_name(visit.file_name) {
            if self.extensions.contains(&ext) {
                self.results.add(visit.full_path.to_path_buf());
            }
        }
        ScanControl::KeepGoing
    }
}

/// A `folder/folder.ext` match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRoot {
    /// Directory containing the package folder
    pub parent_path: PathBuf,
    /// Name of the package folder (and file stem)
    pub package_name: String,
    pub file_name: String,
}

impl PackageRoot {
    pub fn path(&self) -> PathBuf {
        self.parent_path.join(&self.package_name)
    }
}

impl ScanResult for PackageRoot {
    fn identity(&self) -> String {
        self.path().join(&self.file_name).to_string_lossy().into_owned()
    }
}

/// Collects Arduino15-style package folders
#[derive(Debug)]
pub struct PackageAggregator {
    state: VisitorState,
    extensions: &'static [&'static str],
    excluded_parents: &'static [&'static str],
    results: ResultSet<PackageRoot>,
}

impl PackageAggregator {
    pub fn new(extensions: &'static [&'static str], options: ScanOptions) -> Self {
        Self {
            state: VisitorState::new(options),
            extensions,
            excluded_parents: &[],
            results: ResultSet::new(),
        }
    }

    /// Ignore packages whose folder sits directly inside one of `names`
    #[must_use]
    pub fn excluding_parents(mut self, names: &'static [&'static str]) -> Self {
        self.excluded_parents = names;
        self
    }

    pub fn results(&self) -> &ResultSet<PackageRoot> {
        &self.results
    }

    pub fn into_results(self) -> Vec<PackageRoot> {
        self.results.into_vec()
    }
}

impl SearchVisitor for PackageAggregator {
    fn state(&self) -> &VisitorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut VisitorState {
        &mut self.state
    }

    fn on_visit_file(&mut self, visit: &FileVisit<'_>) -> ScanControl {
        let Some((stem, ext)) = split_two_part_name(visit.file_name) else {
            return ScanControl::KeepGoing;
        };
        if stem != visit.folder_name || !self.extensions.contains(&ext) {
            return ScanControl::KeepGoing;
        }

        let Some(parent_path) = visit.folder_path.parent() else {
            return ScanControl::KeepGoing;
        };
        let parent_name = parent_path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        if self.excluded_parents.iter().any(|name| *name == parent_name) {
            return ScanControl::KeepGoing;
        }

        self.results.add(PackageRoot {
            parent_path: parent_path.to_path_buf(),
            package_name: stem.to_string(),
            file_name: visit.file_name.to_string(),
        });
        ScanControl::KeepGoing
    }
}
