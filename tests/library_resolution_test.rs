//! Integration tests for project library resolution
//!
//! Includes found in sketch sources are matched against the libraries of
//! the environment, the platform and the project, then followed
//! transitively through the libraries' own sources.

mod common;

use std::path::PathBuf;

use arturo::core::dependencies::LibraryResolver;
use arturo::core::project::{Configuration, Project};
use arturo::error::{ArturoError, LibraryError};
use common::{write, TestEnvironment};

fn keys<T>(found: &arturo::core::properties::OrderedMap<T>) -> Vec<String> {
    found.keys().map(ToString::to_string).collect()
}

/// Write a scratch source next to the sketch and return its path
fn source(fixture: &TestEnvironment, name: &str, content: &str) -> PathBuf {
    let path = fixture.sketches.path().join("scratch").join(name);
    write(&path, content);
    path
}

// ============================================
// Discovery
// ============================================

#[test]
fn test_environment_libraries_skip_malformed_folders() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let libraries = env.libraries().unwrap();

    assert!(libraries.contains_name("Servo"));
    assert!(libraries.contains_name("Wire"));
    assert!(!libraries.contains_name("NotALibrary"));

    let sensors: Vec<&str> = libraries.versions("Sensor").iter().map(|l| l.version()).collect();
    assert_eq!(sensors, vec!["2.4", "1.2"]);
}

#[test]
fn test_project_library_collection_layers() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let project = Project::infer(&fixture.project());
    let config = Configuration::new(&env, &project, "arduino", "avr", "uno", ".");

    let libraries = config.libraries().unwrap();
    assert!(libraries.contains_name("Servo"));
    assert!(libraries.contains_name("Local"));
    assert_eq!(
        libraries.newest("EEPROM").unwrap().platform(),
        Some("Arduino AVR Boards")
    );
}

#[test]
fn test_installed_library_hides_index_releases() {
    let fixture = TestEnvironment::new();
    fixture.create_file(
        "library_index.json",
        r#"{"libraries": [
            {"name": "Servo", "version": "1.2.0"},
            {"name": "Ethernet", "version": "1.0.4"}
        ]}"#,
    );
    let env = fixture.environment();
    let libraries = env.libraries().unwrap();

    assert!(libraries.get("Servo", "1.2.0").is_none());
    assert!(libraries.get("Ethernet", "1.0.4").unwrap().path().is_none());
    let file = source(&fixture, "a.cpp", "#include <Servo.h>\n");

    let mut resolver = LibraryResolver::new(libraries, env.search_path()).unwrap();
    let found = resolver.libs_for_files(std::slice::from_ref(&file)).unwrap();
    assert_eq!(keys(&found), vec!["Servo-1.1.2"]);

    let mut resolver = LibraryResolver::new(libraries, env.search_path())
        .unwrap()
        .include_header_only();
    let found = resolver.libs_for_files(&[file]).unwrap();
    assert_eq!(keys(&found), vec!["Servo-1.1.2"]);
}

// ============================================
// Resolution
// ============================================

#[test]
fn test_unknown_includes_are_ignored() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let file = source(&fixture, "a.cpp", "#include <stdio.h>\n#include \"local_header.h\"\n");

    let mut resolver = LibraryResolver::new(env.libraries().unwrap(), env.search_path()).unwrap();
    let found = resolver.libs_for_files(&[file]).unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_transitive_closure_skips_header_only_by_default() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let file = source(&fixture, "a.cpp", "#include <Display.h>\n");
    let libraries = env.libraries().unwrap();

    let mut resolver = LibraryResolver::new(libraries, env.search_path()).unwrap();
    let found = resolver.libs_for_files(std::slice::from_ref(&file)).unwrap();
    assert_eq!(keys(&found), vec!["Display-2.0.1"]);

    let mut resolver = LibraryResolver::new(libraries, env.search_path())
        .unwrap()
        .include_header_only();
    let found = resolver.libs_for_files(&[file]).unwrap();
    assert_eq!(keys(&found), vec!["Display-2.0.1", "Wire-1.0"]);
}

#[test]
fn test_unversioned_include_picks_newest() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let file = source(&fixture, "a.cpp", "#include <Sensor.h>\n");

    let mut resolver = LibraryResolver::new(env.libraries().unwrap(), env.search_path()).unwrap();
    let found = resolver.libs_for_files(&[file]).unwrap();
    assert_eq!(keys(&found), vec!["Sensor-2.4"]);
}

#[test]
fn test_versioned_include_picks_compatible_release() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let file = source(&fixture, "a.cpp", "#include <Sensor-2.0/Sensor.h>\n");

    let mut resolver = LibraryResolver::new(env.libraries().unwrap(), env.search_path()).unwrap();
    let found = resolver.libs_for_files(&[file]).unwrap();
    assert_eq!(keys(&found), vec!["Sensor-2.4"]);
}

#[test]
fn test_unsatisfiable_version_is_an_error() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let file = source(&fixture, "a.cpp", "#include <Sensor-3.0/Sensor.h>\n");

    let mut resolver = LibraryResolver::new(env.libraries().unwrap(), env.search_path()).unwrap();
    let err = resolver.libs_for_files(&[file.clone()]).unwrap_err();
    match err {
        ArturoError::Library(LibraryError::UnresolvedLibraryDependency {
            source_file,
            name,
            version,
        }) => {
            assert_eq!(source_file, file);
            assert_eq!(name, "Sensor");
            assert_eq!(version.as_deref(), Some("3.0"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_conflicting_versions_across_files_are_ambiguous() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let first = source(&fixture, "a.cpp", "#include <Sensor-1.0/Sensor.h>\n");
    let second = source(&fixture, "b.cpp", "#include <Sensor-2.0/Sensor.h>\n");

    let mut resolver = LibraryResolver::new(env.libraries().unwrap(), env.search_path()).unwrap();
    let err = resolver.libs_for_files(&[first, second]).unwrap_err();
    assert!(
        matches!(
            err,
            ArturoError::Library(LibraryError::AmbiguousLibraryVersion { ref name, .. }) if name == "Sensor"
        ),
        "{err}"
    );
}

#[test]
fn test_same_version_in_several_files_is_fine() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let first = source(&fixture, "a.cpp", "#include <Sensor-1.0/Sensor.h>\n");
    let second = source(&fixture, "b.cpp", "#include <Sensor-1.0/Sensor.h>\n");

    let mut resolver = LibraryResolver::new(env.libraries().unwrap(), env.search_path()).unwrap();
    let found = resolver.libs_for_files(&[first, second]).unwrap();
    assert_eq!(keys(&found), vec!["Sensor-2.4"]);
}

#[test]
fn test_libs_for_library_excludes_itself() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let libraries = env.libraries().unwrap();
    let display = libraries.find("Display").unwrap();

    let mut resolver = LibraryResolver::new(libraries, env.search_path())
        .unwrap()
        .include_header_only();
    let found = resolver.libs_for_library(display).unwrap();
    assert_eq!(keys(&found), vec!["Wire-1.0"]);
}

// ============================================
// Projects
// ============================================

#[test]
fn test_sketch_libraries_ignore_build_folder_and_comments() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let project = Project::infer(&fixture.project());
    let config = Configuration::new(&env, &project, "arduino", "avr", "uno", ".");

    let found = config.resolve_libraries().unwrap();
    assert_eq!(keys(&found), vec!["Servo-1.1.2", "SPI-1.0"]);
}

#[test]
fn test_manifest_lists_resolved_libraries() {
    let fixture = TestEnvironment::new();
    let env = fixture.environment();
    let project = Project::infer(&fixture.project());
    let config = Configuration::new(&env, &project, "arduino", "avr", "uno", ".");

    let manifest = config.build_manifest(None, true).unwrap();
    assert_eq!(manifest.project, "blink");
    assert_eq!(manifest.board, "uno");
    assert_eq!(manifest.libraries, vec!["Servo-1.1.2", "SPI-1.0"]);
    assert_eq!(manifest.build_dir, fixture.project().join(".build_ano2/uno"));
}
