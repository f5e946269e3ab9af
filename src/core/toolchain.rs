//! Toolchains declared by packages and their per-host downloads
//!
//! A [`ToolChain`] is one `(name, version)` release from the package index. It
//! lists a download per host system; [`ToolChain::host_toolchain`] picks the
//! one that runs on this machine using an ordered priority table: a 64-bit
//! host prefers its native build and falls back to 32-bit ones.

use regex::Regex;
use std::cell::OnceCell;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::config::defaults::{PACKAGES_DIR, TOOLS_DIR};
use crate::core::index::{HostSystem, ToolChainMetadata};
use crate::infra::search_path::SearchPath;

/// Operating system and machine of a host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostInfo {
    /// `linux`, `macos`, `windows`, ...
    pub os: String,
    /// `x86_64`, `aarch64`, `x86`, ...
    pub machine: String,
}

impl HostInfo {
    pub fn new(os: impl Into<String>, machine: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            machine: machine.into(),
        }
    }

    /// Detect the current host
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }
}

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.machine)
    }
}

/// Machine pattern and the host-system patterns it may run, best first
type MachineRule = (&'static str, &'static [&'static str]);

/// Host-system preferences per operating system
///
/// Machine patterns are tried in order and must match the whole machine name.
/// Host patterns are anchored at the start of the index's `host` string.
const HOST_PATTERNS: &[(&str, &[MachineRule])] = &[
    (
        "macos",
        &[
            ("x86_64", &["x86_64-apple-darwin.*", "i[3456]86-apple-darwin.*"]),
            (
                "aarch64|arm64",
                &[
                    "arm64-apple-darwin.*",
                    "aarch64-apple-darwin.*",
                    "x86_64-apple-darwin.*",
                    "i[3456]86-apple-darwin.*",
                ],
            ),
            ("i[3456]86|x86", &["i[3456]86-apple-darwin.*"]),
        ],
    ),
    (
        "windows",
        &[
            (
                "x86_64",
                &["x86_64-.*mingw32", "i[3456]86-.*mingw32", "i[3456]86-.*cygwin"],
            ),
            (".*", &["i[3456]86-.*mingw32", "i[3456]86-.*cygwin"]),
        ],
    ),
    (
        "linux",
        &[
            ("x86_64|amd64", &["x86_64-.*linux-gnu", "i[3456]86-.*linux-gnu"]),
            ("aarch64|arm64", &["aarch64-.*linux-gnu", "arm.*-linux-gnueabihf"]),
            ("arm.*", &["arm.*-linux-gnueabihf"]),
            ("i[3456]86|x86", &["i[3456]86-.*linux-gnu"]),
        ],
    ),
];

struct CompiledRule {
    machine: Regex,
    hosts: Vec<Regex>,
}

fn compiled_patterns() -> &'static [(&'static str, Vec<CompiledRule>)] {
    static COMPILED: OnceLock<Vec<(&'static str, Vec<CompiledRule>)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        HOST_PATTERNS
            .iter()
            .map(|(os, rules)| {
                let rules = rules
                    .iter()
                    .filter_map(|(machine, hosts)| {
                        Some(CompiledRule {
                            machine: Regex::new(&format!("^(?:{machine})$")).ok()?,
                            hosts: hosts
                                .iter()
                                .filter_map(|host| Regex::new(&format!("^(?:{host})")).ok())
                                .collect(),
                        })
                    })
                    .collect();
                (*os, rules)
            })
            .collect()
    })
}

/// Pick the best host system for `host` out of `systems`
///
/// The first host pattern (in priority order) that matches any system wins,
/// regardless of the order the systems were declared in.
pub fn resolve_host_system<'s>(systems: &'s [HostSystem], host: &HostInfo) -> Option<&'s HostSystem> {
    let (_, rules) = compiled_patterns()
        .iter()
        .find(|(os, _)| os.eq_ignore_ascii_case(&host.os))?;

    rules
        .iter()
        .filter(|rule| rule.machine.is_match(&host.machine))
        .flat_map(|rule| rule.hosts.iter())
        .find_map(|pattern| systems.iter().find(|system| pattern.is_match(&system.host)))
}

/// A toolchain release from one package
#[derive(Debug, Clone)]
pub struct ToolChain {
    packager: String,
    name: String,
    version: String,
    systems: Vec<HostSystem>,
    host: OnceCell<Option<HostToolChain>>,
}

impl ToolChain {
    pub fn new(packager: impl Into<String>, metadata: &ToolChainMetadata) -> Self {
        Self {
            packager: packager.into(),
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            systems: metadata.systems.clone(),
            host: OnceCell::new(),
        }
    }

    /// Name of the package declaring this toolchain
    pub fn packager(&self) -> &str {
        &self.packager
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Host systems in declaration order
    pub fn systems(&self) -> &[HostSystem] {
        &self.systems
    }

    /// The download for this machine, computed once
    pub fn host_toolchain(&self) -> Option<&HostToolChain> {
        self.host
            .get_or_init(|| self.resolve_host(&HostInfo::current()))
            .as_ref()
    }

    /// The download for an arbitrary host
    pub fn resolve_host(&self, host: &HostInfo) -> Option<HostToolChain> {
        let system = resolve_host_system(&self.systems, host);
        if system.is_none() {
            tracing::debug!(
                "No {} build of {}-{} declared by {}",
                host,
                self.name,
                self.version,
                self.packager
            );
        }
        system.map(|system| HostToolChain {
            packager: self.packager.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            host: system.host.clone(),
            url: system.url.clone(),
        })
    }
}

/// The host-specific download of a toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostToolChain {
    packager: String,
    name: String,
    version: String,
    host: String,
    url: String,
}

impl HostToolChain {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Install location relative to a search root
    pub fn relative_path(&self) -> PathBuf {
        [
            PACKAGES_DIR,
            self.packager.as_str(),
            TOOLS_DIR,
            self.name.as_str(),
            self.version.as_str(),
        ]
        .iter()
        .collect()
    }

    /// Installed directory, if any root on the search path has it
    pub fn path(&self, search: &SearchPath) -> Option<PathBuf> {
        search.find_dir(self.relative_path())
    }

    pub fn exists(&self, search: &SearchPath) -> bool {
        self.path(search).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn system(host: &str) -> HostSystem {
        HostSystem {
            host: host.to_string(),
            url: format!("http://downloads.example/{host}.tar.bz2"),
            archive_file_name: None,
            checksum: None,
        }
    }

    fn toolchain(hosts: &[&str]) -> ToolChain {
        ToolChain::new(
            "arduino",
            &ToolChainMetadata {
                name: "avr-gcc".to_string(),
                version: "4.8.1-arduino5".to_string(),
                systems: hosts.iter().map(|h| system(h)).collect(),
            },
        )
    }

    #[test]
    fn test_host_info_display() {
        assert_eq!(HostInfo::new("linux", "x86_64").to_string(), "linux-x86_64");
    }

    #[test]
    fn test_priority_beats_declaration_order() {
        let tools = toolchain(&["i686-pc-linux-gnu", "x86_64-pc-linux-gnu"]);
        let host = tools
            .resolve_host(&HostInfo::new("linux", "x86_64"))
            .unwrap();
        assert_eq!(host.host(), "x86_64-pc-linux-gnu");
    }

    #[test]
    fn test_64_bit_host_falls_back_to_32_bit() {
        let tools = toolchain(&["i686-pc-linux-gnu", "i386-apple-darwin11"]);
        let linux = tools
            .resolve_host(&HostInfo::new("linux", "x86_64"))
            .unwrap();
        assert_eq!(linux.host(), "i686-pc-linux-gnu");

        let mac = tools
            .resolve_host(&HostInfo::new("macos", "x86_64"))
            .unwrap();
        assert_eq!(mac.host(), "i386-apple-darwin11");
    }

    #[test]
    fn test_32_bit_host_never_picks_64_bit() {
        let tools = toolchain(&["x86_64-pc-linux-gnu"]);
        assert!(tools.resolve_host(&HostInfo::new("linux", "x86")).is_none());
    }

    #[test]
    fn test_windows_matches_any_machine() {
        let tools = toolchain(&["i686-mingw32"]);
        let host = tools
            .resolve_host(&HostInfo::new("windows", "x86"))
            .unwrap();
        assert_eq!(host.host(), "i686-mingw32");
        assert_eq!(host.url(), "http://downloads.example/i686-mingw32.tar.bz2");
    }

    #[test]
    fn test_unknown_os_has_no_host() {
        let tools = toolchain(&["x86_64-pc-linux-gnu"]);
        assert!(tools
            .resolve_host(&HostInfo::new("plan9", "x86_64"))
            .is_none());
    }

    #[test]
    fn test_host_toolchain_is_memoized() {
        let tools = toolchain(&["x86_64-pc-linux-gnu", "i686-pc-linux-gnu"]);
        let first = tools.host_toolchain().map(|h| h as *const HostToolChain);
        let second = tools.host_toolchain().map(|h| h as *const HostToolChain);
        assert_eq!(first, second);
    }

    #[test]
    fn test_host_toolchain_path_on_search_path() {
        let root = TempDir::new().unwrap();
        let tools = toolchain(&["x86_64-pc-linux-gnu"]);
        let host = tools
            .resolve_host(&HostInfo::new("linux", "x86_64"))
            .unwrap();
        let search = SearchPath::new(vec![root.path().to_path_buf()]);
        assert!(!host.exists(&search));

        let installed = root
            .path()
            .join("packages/arduino/tools/avr-gcc/4.8.1-arduino5");
        std::fs::create_dir_all(&installed).unwrap();
        assert_eq!(host.path(&search), Some(installed));
    }
}
