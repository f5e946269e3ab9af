//! Search path lookups and cycle-safe directory scanning
//!
//! A [`SearchPath`] is an ordered list of root directories. Relative names
//! resolve against the roots in order and the first hit wins; the order is
//! whatever the caller configured and is never re-sorted.
//!
//! [`SearchPath::scan_dirs`] walks a directory tree depth first and hands every
//! entry to a [`SearchVisitor`]. The visitor owns the results and the scan
//! options; the searcher only owns the traversal.

use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::defaults::DEFAULT_EXCLUDE_PATTERNS;
use crate::error::SearchPathError;

/// What a visitor wants the scanner to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    /// Keep scanning
    KeepGoing,
    /// Stop the whole scan immediately
    Done,
    /// From `on_visit_dir`: do not descend into that directory.
    /// From `on_visit_file`: ignore the rest of the containing directory.
    SkipDir,
}

/// Per-scan options carried by a visitor
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Entry names skipped in addition to the default exclusions
    pub exclusions: HashSet<String>,
    /// Skip dotfiles and the build directory
    pub use_default_excludes: bool,
    /// Descend into symlinked directories
    pub follow_links: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclusions: HashSet::new(),
            use_default_excludes: true,
            follow_links: false,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_exclusions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn default_excludes(mut self, enabled: bool) -> Self {
        self.use_default_excludes = enabled;
        self
    }

    #[must_use]
    pub fn follow_links(mut self, enabled: bool) -> Self {
        self.follow_links = enabled;
        self
    }
}

/// Mutable state a visitor carries through one scan
#[derive(Debug, Default)]
pub struct VisitorState {
    options: ScanOptions,
    visited: HashSet<PathBuf>,
}

impl VisitorState {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            visited: HashSet::new(),
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Canonical paths of every directory entered so far
    pub fn visited(&self) -> &HashSet<PathBuf> {
        &self.visited
    }
}

/// A directory found while scanning
#[derive(Debug)]
pub struct DirVisit<'a> {
    pub parent_path: &'a Path,
    pub folder_path: &'a Path,
    pub folder_name: &'a str,
    pub full_path: &'a Path,
    pub canonical_path: &'a Path,
    pub depth: usize,
}

/// A file found while scanning
#[derive(Debug)]
pub struct FileVisit<'a> {
    pub parent_path: &'a Path,
    /// Directory containing the file
    pub folder_path: &'a Path,
    /// Name of the directory containing the file
    pub folder_name: &'a str,
    pub file_name: &'a str,
    pub full_path: &'a Path,
}

/// Callback protocol driven by [`SearchPath::scan_dirs`]
pub trait SearchVisitor {
    fn state(&self) -> &VisitorState;

    fn state_mut(&mut self) -> &mut VisitorState;

    fn on_visit_dir(&mut self, _visit: &DirVisit<'_>) -> ScanControl {
        ScanControl::KeepGoing
    }

    fn on_visit_file(&mut self, _visit: &FileVisit<'_>) -> ScanControl {
        ScanControl::KeepGoing
    }
}

/// A value that can be collected by a visitor
///
/// Results are de-duplicated by their identity string.
pub trait ScanResult {
    fn identity(&self) -> String;
}

impl ScanResult for PathBuf {
    fn identity(&self) -> String {
        self.to_string_lossy().into_owned()
    }
}

impl ScanResult for String {
    fn identity(&self) -> String {
        self.clone()
    }
}

/// Ordered, de-duplicated scan results
#[derive(Debug, Clone)]
pub struct ResultSet<T> {
    list: Vec<T>,
    seen: HashSet<String>,
}

impl<T> Default for ResultSet<T> {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<T: ScanResult> ResultSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result unless one with the same identity is already present
    ///
    /// Returns `true` if the result was new.
    pub fn add(&mut self, result: T) -> bool {
        if self.seen.insert(result.identity()) {
            self.list.push(result);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, result: &T) -> bool {
        self.seen.contains(&result.identity())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.list
    }
}

fn default_exclude_matchers() -> &'static [Regex] {
    static MATCHERS: OnceLock<Vec<Regex>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        DEFAULT_EXCLUDE_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(&format!("^(?:{pattern})")).ok())
            .collect()
    })
}

/// Ordered list of candidate root directories
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
    /// Options handed to the model's own scans (cores, libraries, projects)
    scan_defaults: ScanOptions,
}

impl SearchPath {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            scan_defaults: ScanOptions::new().follow_links(true),
        }
    }

    #[must_use]
    pub fn with_scan_defaults(mut self, options: ScanOptions) -> Self {
        self.scan_defaults = options;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Fresh copy of the options model scans start from
    pub fn scan_options(&self) -> ScanOptions {
        self.scan_defaults.clone()
    }

    /// First `root/name` that is a regular file
    pub fn find_file(&self, name: impl AsRef<Path>) -> Option<PathBuf> {
        self.find_first(name.as_ref(), Path::is_file)
    }

    /// First `root/name` that is a directory
    pub fn find_dir(&self, name: impl AsRef<Path>) -> Option<PathBuf> {
        self.find_first(name.as_ref(), Path::is_dir)
    }

    /// Try each candidate name across the whole search path
    ///
    /// The first candidate found anywhere wins; candidates are tried in order.
    pub fn find_first_file_of_name_or_throw(
        &self,
        file_names: &[&str],
        generic_name: &str,
    ) -> Result<PathBuf, SearchPathError> {
        file_names
            .iter()
            .find_map(|name| self.find_file(name))
            .ok_or_else(|| SearchPathError::MissingRequiredFile {
                generic_name: generic_name.to_string(),
                file_names: file_names.iter().map(ToString::to_string).collect(),
                searched: self.roots.clone(),
            })
    }

    /// Depth-first, cycle-safe scan of `root`
    ///
    /// Returns [`ScanControl::Done`] if the visitor stopped the scan.
    pub fn scan_dirs<V: SearchVisitor + ?Sized>(
        &self,
        root: &Path,
        visitor: &mut V,
    ) -> Result<ScanControl, SearchPathError> {
        let parent_path = canonical_or_self(&root.join(".."));
        let canonical_root = canonical_or_self(root);
        let folder_name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.scan_recursive(&parent_path, root, &folder_name, canonical_root, visitor, 0)
    }

    /// True if `name` matches a default exclusion pattern
    pub fn is_excluded_by_default(name: &str) -> bool {
        default_exclude_matchers()
            .iter()
            .any(|matcher| matcher.is_match(name))
    }

    fn scan_recursive<V: SearchVisitor + ?Sized>(
        &self,
        parent_path: &Path,
        folder_path: &Path,
        folder_name: &str,
        canonical_folder: PathBuf,
        visitor: &mut V,
        depth: usize,
    ) -> Result<ScanControl, SearchPathError> {
        visitor.state_mut().visited.insert(canonical_folder);

        let entries = fs::read_dir(folder_path).map_err(|e| SearchPathError::ReadDir {
            path: folder_path.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut dirs_to_traverse: Vec<(PathBuf, String, PathBuf)> = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| SearchPathError::ReadDir {
                path: folder_path.to_path_buf(),
                error: e.to_string(),
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();

            let options = visitor.state().options();
            if options.use_default_excludes && Self::is_excluded_by_default(&name) {
                tracing::debug!("Skipping {} by default.", name);
                continue;
            }
            if options.exclusions.contains(&name) {
                tracing::debug!("Skipping {} by exclusion rule.", name);
                continue;
            }
            let follow_links = options.follow_links;

            let full_path = folder_path.join(&name);
            if full_path.is_dir() {
                let canonical_dir = canonical_or_self(&full_path);
                let visit = DirVisit {
                    parent_path,
                    folder_path,
                    folder_name: &name,
                    full_path: &full_path,
                    canonical_path: &canonical_dir,
                    depth,
                };
                match visitor.on_visit_dir(&visit) {
                    ScanControl::KeepGoing => {}
                    ScanControl::SkipDir => continue,
                    ScanControl::Done => return Ok(ScanControl::Done),
                }

                let is_link = fs::symlink_metadata(&full_path)
                    .map(|meta| meta.file_type().is_symlink())
                    .unwrap_or(false);
                if is_link && !follow_links {
                    tracing::trace!("Not following link {}", full_path.display());
                    visitor.state_mut().visited.insert(canonical_dir);
                } else if !visitor.state().visited.contains(&canonical_dir) {
                    dirs_to_traverse.push((full_path, name, canonical_dir));
                }
            } else {
                let visit = FileVisit {
                    parent_path,
                    folder_path,
                    folder_name,
                    file_name: &name,
                    full_path: &full_path,
                };
                match visitor.on_visit_file(&visit) {
                    ScanControl::KeepGoing => {}
                    ScanControl::SkipDir => return Ok(ScanControl::KeepGoing),
                    ScanControl::Done => return Ok(ScanControl::Done),
                }
            }
        }

        for (dir_path, dir_name, canonical_dir) in dirs_to_traverse {
            // a sibling may have reached the same directory through a link
            if visitor.state().visited.contains(&canonical_dir) {
                continue;
            }
            let result = self.scan_recursive(
                folder_path,
                &dir_path,
                &dir_name,
                canonical_dir,
                visitor,
                depth + 1,
            )?;
            if result == ScanControl::Done {
                return Ok(result);
            }
        }

        Ok(ScanControl::KeepGoing)
    }

    fn find_first(&self, element: &Path, exists: fn(&Path) -> bool) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(element))
            .find(|candidate| exists(candidate))
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
