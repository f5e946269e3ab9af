//! Library dependency resolution from `#include` statements
//!
//! Sources and headers are scanned line by line for `#include <...>` and
//! `#include "..."`. The included header names a library; a versioned parent
//! folder (`Servo-2.1/Servo.h`) pins a version. Each include is matched
//! against the available libraries and the closure over library-to-library
//! includes is followed depth first.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::core::library::{Library, LibraryCollection};
use crate::core::properties::OrderedMap;
use crate::core::version::compare_loose;
use crate::error::{ArturoError, LibraryError};
use crate::infra::search_path::SearchPath;

const INCLUDE_PATTERN: &str = r#"^\s*#include\s*[<"]\s*([a-zA-Z0-9_/\.\-]*)\s*[>"]"#;
const VERSIONED_FOLDER_PATTERN: &str = r"^(\w+)-(\d+)(?:\.(\d+))?(?:\.(\d+))?$";

/// Opens a block comment that does not close on the same line
fn opens_block_comment(line: &str) -> bool {
    line.rfind("/*")
        .is_some_and(|start| !line[start + 2..].contains("*/"))
}

fn closes_block_comment(line: &str) -> bool {
    line.contains("*/")
}

/// Finds the libraries named by `#include` lines
#[derive(Debug, Clone)]
pub struct IncludeScanner {
    include: Regex,
    versioned_folder: Regex,
}

impl IncludeScanner {
    pub fn new() -> Result<Self, LibraryError> {
        Ok(Self {
            include: compile(INCLUDE_PATTERN)?,
            versioned_folder: compile(VERSIONED_FOLDER_PATTERN)?,
        })
    }

    /// Library names and optional versions included by a file
    pub fn includes_in_file(&self, path: &Path) -> Result<OrderedMap<Option<String>>, LibraryError> {
        tracing::debug!("Looking for includes in {}", path.display());
        let bytes = std::fs::read(path).map_err(|e| LibraryError::ReadFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        self.includes_in_str(path, &String::from_utf8_lossy(&bytes))
    }

    /// Library names and optional versions included by `content`
    ///
    /// Includes inside a block comment that spans lines are ignored. One file
    /// naming two different versions of a library is an error.
    pub fn includes_in_str(
        &self,
        origin: &Path,
        content: &str,
    ) -> Result<OrderedMap<Option<String>>, LibraryError> {
        let mut included: OrderedMap<Option<String>> = OrderedMap::new();
        let mut commented_out = false;

        for line in content.lines() {
            if commented_out {
                commented_out = !closes_block_comment(line);
                if let Some(header) = self.include_target(line) {
                    tracing::trace!("Ignoring commented out include {}", header);
                }
                continue;
            }

            if let Some(header) = self.include_target(line) {
                let (name, version) = self.header_to_name_and_version(header);
                tracing::trace!("Found include {} ({})", header, line.trim());
                match included.get(&name) {
                    Some(Some(first))
                        if version.as_deref().is_some_and(|v| !same_version(v, first)) =>
                    {
                        return Err(LibraryError::AmbiguousLibraryVersion {
                            first: first.clone(),
                            second: version.unwrap_or_default(),
                            name,
                            source_file: origin.to_path_buf(),
                        });
                    }
                    Some(Some(_)) => {}
                    _ => {
                        included.insert(name, version);
                    }
                }
            }
            if opens_block_comment(line) {
                commented_out = true;
            }
        }
        Ok(included)
    }

    /// Split an include path into a library name and optional version
    ///
    /// - `foobar-2.0/foobar.h` is `("foobar", Some("2.0"))`
    /// - `baz-2.0/foobar.h` is `("foobar", None)`
    /// - `foobar/baz.h` is `("baz", None)`
    pub fn header_to_name_and_version(&self, header: &str) -> (String, Option<String>) {
        let mut elements = header.rsplit('/');
        let file_name = elements.next().unwrap_or(header);
        let name = file_name
            .rsplit_once('.')
            .map_or(file_name, |(stem, _)| stem)
            .to_string();

        let version = elements.next().and_then(|folder| {
            let captures = self.versioned_folder.captures(folder)?;
            if captures.get(1)?.as_str() != name {
                return None;
            }
            let components: Vec<&str> = (2..=4)
                .map_while(|group| captures.get(group).map(|m| m.as_str()))
                .collect();
            Some(components.join("."))
        });
        (name, version)
    }

    fn include_target<'l>(&self, line: &'l str) -> Option<&'l str> {
        self.include
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
    }
}

fn compile(pattern: &str) -> Result<Regex, LibraryError> {
    Regex::new(pattern).map_err(|e| LibraryError::InvalidPattern {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })
}

/// Matches includes against a library collection
pub struct LibraryResolver<'c> {
    scanner: IncludeScanner,
    libraries: &'c LibraryCollection,
    search: &'c SearchPath,
    exclude_header_only: bool,
    /// First explicit version seen for each library across the whole run
    pinned: HashMap<String, (String, PathBuf)>,
}

impl<'c> LibraryResolver<'c> {
    pub fn new(libraries: &'c LibraryCollection, search: &'c SearchPath) -> Result<Self, LibraryError> {
        Ok(Self {
            scanner: IncludeScanner::new()?,
            libraries,
            search,
            exclude_header_only: true,
            pinned: HashMap::new(),
        })
    }

    /// Also report libraries without sources
    #[must_use]
    pub fn include_header_only(mut self) -> Self {
        self.exclude_header_only = false;
        self
    }

    /// Libraries a single file includes, keyed by `name-version`
    ///
    /// Includes that name no known library are ignored; includes whose
    /// version cannot be satisfied are an error.
    pub fn possible_libs_for_source(
        &mut self,
        file: &Path,
    ) -> Result<OrderedMap<&'c Library>, ArturoError> {
        let included = self.scanner.includes_in_file(file)?;
        let mut matched = OrderedMap::new();

        for (name, version) in included.iter() {
            if !self.libraries.contains_name(name) {
                tracing::trace!("{} did not resolve to a known library", name);
                continue;
            }
            if let Some(version) = version {
                self.pin(name, version, file)?;
            }

            let library = match version {
                Some(version) => self.libraries.compatible(name, version),
                None => self.libraries.newest(name),
            }
            .ok_or_else(|| LibraryError::UnresolvedLibraryDependency {
                source_file: file.to_path_buf(),
                name: name.to_string(),
                version: version.clone(),
            })?;

            if self.exclude_header_only && !library.has_source(self.search)? {
                tracing::debug!("{} is header only. Skipping", library.key());
                continue;
            }
            tracing::debug!(
                "{} specified version {} of {}",
                file.display(),
                version.as_deref().unwrap_or("(any)"),
                name
            );
            matched.insert(library.key(), library);
        }
        Ok(matched)
    }

    /// Every library needed by a set of files, including transitive ones
    pub fn libs_for_files(&mut self, files: &[PathBuf]) -> Result<OrderedMap<&'c Library>, ArturoError> {
        let mut found: OrderedMap<&'c Library> = OrderedMap::new();
        for file in files {
            for (key, library) in self.possible_libs_for_source(file)? {
                if !found.contains_key(&key) {
                    found.insert(key, library);
                }
            }
        }

        let mut visited: HashSet<String> = found.keys().map(ToString::to_string).collect();
        let direct: Vec<&'c Library> = found.values().copied().collect();
        for library in direct {
            self.collect_recursive(library, &mut found, &mut visited)?;
        }
        Ok(found)
    }

    /// Every library `library` needs, not counting itself
    pub fn libs_for_library(&mut self, library: &'c Library) -> Result<OrderedMap<&'c Library>, ArturoError> {
        let mut found = OrderedMap::new();
        let mut visited = HashSet::from([library.key()]);
        self.collect_recursive(library, &mut found, &mut visited)?;
        Ok(found)
    }

    fn collect_recursive(
        &mut self,
        library: &'c Library,
        found: &mut OrderedMap<&'c Library>,
        visited: &mut HashSet<String>,
    ) -> Result<(), ArturoError> {
        let headers = library.headers(self.search)?;
        let sources = library.sources(self.search)?;

        for file in headers.iter().chain(sources) {
            for (key, dependency) in self.possible_libs_for_source(file)? {
                if !visited.insert(key.clone()) {
                    continue;
                }
                tracing::debug!("Library {} depends on library {}", library.name(), dependency.name());
                found.insert(key, dependency);
                self.collect_recursive(dependency, found, visited)?;
            }
        }
        Ok(())
    }

    fn pin(&mut self, name: &str, version: &str, file: &Path) -> Result<(), LibraryError> {
        match self.pinned.get(name) {
            Some((first, first_file)) if !same_version(first, version) => Err(LibraryError::AmbiguousLibraryVersion {
                name: name.to_string(),
                first: format!("{first} ({})", first_file.display()),
                second: version.to_string(),
                source_file: file.to_path_buf(),
            }),
            Some(_) => Ok(()),
            None => {
                self.pinned
                    .insert(name.to_string(), (version.to_string(), file.to_path_buf()));
                Ok(())
            }
        }
    }
}

/// `2.0` and `2.0.0` name the same release
fn same_version(a: &str, b: &str) -> bool {
    compare_loose(a, b).is_eq()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scanner() -> IncludeScanner {
        IncludeScanner::new().unwrap()
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    // ============================================
    // Include scanning
    // ============================================

    #[test]
    fn test_header_to_name_and_version() {
        let s = scanner();
        assert_eq!(
            s.header_to_name_and_version("foobar-2.0/foobar.h"),
            ("foobar".to_string(), Some("2.0".to_string()))
        );
        assert_eq!(
            s.header_to_name_and_version("foobar-2/foobar.h"),
            ("foobar".to_string(), Some("2".to_string()))
        );
        assert_eq!(s.header_to_name_and_version("baz-2.0/foobar.h"), ("foobar".to_string(), None));
        assert_eq!(s.header_to_name_and_version("foobar.h"), ("foobar".to_string(), None));
        assert_eq!(s.header_to_name_and_version("foobar/baz.h"), ("baz".to_string(), None));
    }

    #[test]
    fn test_includes_ignore_block_comments() {
        let content = "#include <Servo.h>\n\
                       /* start of comment\n\
                       #include <Hidden.h>\n\
                       end */\n\
                       /* one-line */ #include <NotAnInclude.h>\n\
                       #include \"Wire.h\"\n";
        let included = scanner()
            .includes_in_str(Path::new("sketch.ino"), content)
            .unwrap();
        let names: Vec<&str> = included.keys().collect();
        assert_eq!(names, vec!["Servo", "Wire"]);
    }

    #[test]
    fn test_includes_keep_pinned_version() {
        let included = scanner()
            .includes_in_str(
                Path::new("main.cpp"),
                "#include <Servo-2.1/Servo.h>\n#include <Servo.h>\n",
            )
            .unwrap();
        assert_eq!(included.get("Servo"), Some(&Some("2.1".to_string())));
    }

    #[test]
    fn test_two_versions_in_one_file_is_ambiguous() {
        let err = scanner()
            .includes_in_str(
                Path::new("main.cpp"),
                "#include <Foo-1.0/Foo.h>\n#include <Foo-2.0/Foo.h>\n",
            )
            .unwrap_err();
        match err {
            LibraryError::AmbiguousLibraryVersion {
                name, first, second, ..
            } => {
                assert_eq!(name, "Foo");
                assert_eq!(first, "1.0");
                assert_eq!(second, "2.0");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_equivalent_versions_in_one_file_agree() {
        let included = scanner()
            .includes_in_str(
                Path::new("main.cpp"),
                "#include <Foo-2.0/Foo.h>\n#include <Foo-2.0.0/Foo.h>\n",
            )
            .unwrap();
        assert_eq!(included.get("Foo"), Some(&Some("2.0".to_string())));
    }

    #[test]
    fn test_comment_closed_on_opening_line_is_not_a_block() {
        assert!(opens_block_comment("code(); /* open"));
        assert!(!opens_block_comment("/* closed */ code();"));
        assert!(opens_block_comment("/* closed */ /* open"));
    }

    // ============================================
    // Resolution
    // ============================================

    struct Fixture {
        root: TempDir,
        libraries: LibraryCollection,
        search: SearchPath,
    }

    fn fixture() -> Fixture {
        let root = TempDir::new().unwrap();
        let lib = |dir: &str, header: &str, source: Option<&str>| {
            let path = root.path().join("libraries").join(dir);
            write(&path.join(format!("{header}.h")), "");
            if let Some(content) = source {
                write(&path.join(format!("{header}.cpp")), content);
            }
        };
        lib("Foo-1.0", "Foo", Some(""));
        lib("Foo-2.0", "Foo", Some(""));
        lib("Foo-2.1", "Foo", Some("#include <Bar.h>\n"));
        lib("Bar", "Bar", Some("#include <Baz.h>\n#include <Foo.h>\n"));
        lib("Baz", "Baz", Some(""));
        lib("Constants", "Constants", None);

        let libraries =
            crate::core::library::discover_libraries(root.path(), &[], false, None).unwrap();
        Fixture {
            root,
            libraries,
            search: SearchPath::new(vec![]),
        }
    }

    #[test]
    fn test_compatible_version_picks_highest_same_or_newer_major() {
        let f = fixture();
        let sketch = f.root.path().join("sketch.ino");
        write(&sketch, "#include <Foo-2/Foo.h>\n");

        let mut resolver = LibraryResolver::new(&f.libraries, &f.search).unwrap();
        let matched = resolver.possible_libs_for_source(&sketch).unwrap();
        let keys: Vec<&str> = matched.keys().collect();
        assert_eq!(keys, vec!["Foo-2.1"]);
    }

    #[test]
    fn test_unsatisfiable_version_is_an_error() {
        let f = fixture();
        let sketch = f.root.path().join("sketch.ino");
        write(&sketch, "#include <Foo-3.0/Foo.h>\n");

        let mut resolver = LibraryResolver::new(&f.libraries, &f.search).unwrap();
        let err = resolver.possible_libs_for_source(&sketch).unwrap_err();
        assert!(err.to_string().contains("depends on version 3.0 of Foo"));
    }

    #[test]
    fn test_unknown_includes_and_header_only_skipped() {
        let f = fixture();
        let sketch = f.root.path().join("sketch.ino");
        write(&sketch, "#include <Arduino.h>\n#include <Constants.h>\n");

        let mut resolver = LibraryResolver::new(&f.libraries, &f.search).unwrap();
        assert!(resolver.possible_libs_for_source(&sketch).unwrap().is_empty());

        let mut resolver = LibraryResolver::new(&f.libraries, &f.search)
            .unwrap()
            .include_header_only();
        let keys: Vec<String> = resolver
            .possible_libs_for_source(&sketch)
            .unwrap()
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["Constants-1.0"]);
    }

    #[test]
    fn test_transitive_closure_terminates_on_cycles() {
        let f = fixture();
        let sketch = f.root.path().join("sketch.ino");
        write(&sketch, "#include <Foo.h>\n");

        let mut resolver = LibraryResolver::new(&f.libraries, &f.search).unwrap();
        let found = resolver.libs_for_files(&[sketch]).unwrap();
        let mut keys: Vec<&str> = found.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["Bar-1.0", "Baz-1.0", "Foo-2.1"]);
    }

    #[test]
    fn test_libs_for_library_excludes_itself() {
        let f = fixture();
        let bar = f.libraries.get("Bar", "1.0").unwrap();

        let mut resolver = LibraryResolver::new(&f.libraries, &f.search).unwrap();
        let found = resolver.libs_for_library(bar).unwrap();
        let mut keys: Vec<&str> = found.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["Baz-1.0", "Foo-2.1"]);
    }

    #[test]
    fn test_ambiguous_across_files() {
        let f = fixture();
        let first = f.root.path().join("a.cpp");
        let second = f.root.path().join("b.cpp");
        write(&first, "#include <Foo-1.0/Foo.h>\n");
        write(&second, "#include <Foo-2.0/Foo.h>\n");

        let mut resolver = LibraryResolver::new(&f.libraries, &f.search).unwrap();
        let err = resolver.libs_for_files(&[first, second]).unwrap_err();
        assert!(matches!(
            err,
            ArturoError::Library(LibraryError::AmbiguousLibraryVersion { .. })
        ));
    }

    #[test]
    fn test_equivalent_versions_across_files_agree() {
        let f = fixture();
        let first = f.root.path().join("a.cpp");
        let second = f.root.path().join("b.cpp");
        write(&first, "#include <Foo-2/Foo.h>\n");
        write(&second, "#include <Foo-2.0/Foo.h>\n");

        let mut resolver = LibraryResolver::new(&f.libraries, &f.search).unwrap();
        let found = resolver.libs_for_files(&[first, second]).unwrap();
        let mut keys: Vec<&str> = found.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["Bar-1.0", "Baz-1.0", "Foo-2.1"]);
    }
}
