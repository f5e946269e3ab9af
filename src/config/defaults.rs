//! Default configuration values
//!
//! File names, folder names and extension sets defined by the Arduino15
//! 3rd-party hardware layout.

/// Application name used for the binary and in directory paths
pub const APP_NAME: &str = "ano";

/// Library name reported through the `{software}` macro
pub const LIB_NAME: &str = "arturo";

/// Version reported through the `{runtime.ide.version}` macro
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit the binary was built from, when built inside a git checkout
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Target triple the binary was built for
pub const BUILD_TARGET: &str = match option_env!("VERGEN_CARGO_TARGET_TRIPLE") {
    Some(triple) => triple,
    None => "unknown",
};

/// Folder holding installed packages, next to the package index
pub const PACKAGES_DIR: &str = "packages";

/// Folder holding toolchains inside a package
pub const TOOLS_DIR: &str = "tools";

/// Folder holding platforms inside a package
pub const HARDWARE_DIR: &str = "hardware";

/// Folder names treated as library containers
pub const LIBRARY_FOLDER_NAMES: &[&str] = &["lib", "libraries"];

/// Build output directory created inside a project
pub const BUILD_DIR_NAME: &str = ".build_ano2";

/// Extensions of compilable sources
pub const SOURCE_EXTENSIONS: &[&str] = &["cpp", "c", "ino"];

/// Extensions of headers
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hpp"];

/// Folders searched for a library's main header, in order
pub const PROJECT_SOURCE_FOLDERS: &[&str] = &["src", "."];

/// Folders never scanned inside a library
pub const LIBRARY_EXAMPLE_FOLDERS: &[&str] = &["examples"];

/// Entries skipped by every scan that keeps default exclusions on
///
/// Matched against the start of the entry name.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[r"\..+", r"\.build_ano2"];

/// Candidate names of the package index
pub const PACKAGE_INDEX_NAMES: &[&str] = &["package_index.json"];

/// Candidate names of the library index
pub const LIBRARY_INDEX_NAMES: &[&str] = &["library_index.json"];

/// Candidate names of the preferences file
pub const PREFERENCE_FILE_NAMES: &[&str] = &["preferences.txt", "arturo.ini", ".anorc"];

/// Board descriptor file inside a platform
pub const BOARDS_FILENAME: &str = "boards.txt";

/// Programmer descriptor file inside a platform
pub const PROGRAMMERS_FILENAME: &str = "programmers.txt";

/// Recipe file inside a platform
pub const PLATFORM_FILENAME: &str = "platform.txt";

/// Library metadata file
pub const LIBRARY_PROPERTIES_FILE: &str = "library.properties";

/// Cores folder inside a platform
pub const CORES_DIR: &str = "cores";

/// Variants folder inside a platform
pub const VARIANTS_DIR: &str = "variants";

/// Version assumed for libraries that declare none
pub const SYNTHETIC_LIBRARY_VERSION: &str = "1.0";
