//! Vendor packages
//!
//! A package is one entry of the package index backed by a directory under
//! `packages/<name>`. It owns the platforms installed under
//! `packages/<name>/hardware` and the toolchains the index declares for it.

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::defaults::HARDWARE_DIR;
use crate::core::index::PackageMetadata;
use crate::core::platform::Platform;
use crate::core::properties::OrderedMap;
use crate::core::toolchain::ToolChain;
use crate::core::version::compare_loose;
use crate::error::HardwareError;
use crate::infra::search_path::SearchPath;

/// One installed vendor package
#[derive(Debug)]
pub struct Package {
    metadata: PackageMetadata,
    path: PathBuf,
    platforms: OnceCell<OrderedMap<Platform>>,
    /// Toolchain releases by name, newest version first
    toolchains: OnceCell<BTreeMap<String, Vec<ToolChain>>>,
}

impl Package {
    /// Open `packages_root/<name>`, which must exist
    pub fn new(packages_root: &Path, metadata: PackageMetadata) -> Result<Self, HardwareError> {
        let path = packages_root.join(&metadata.name);
        if !path.is_dir() {
            return Err(HardwareError::MissingPackageDirectory { path });
        }
        Ok(Self {
            metadata,
            path,
            platforms: OnceCell::new(),
            toolchains: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    pub fn hardware_dir(&self) -> PathBuf {
        self.path.join(HARDWARE_DIR)
    }

    /// Installed platforms keyed by architecture
    ///
    /// Platforms listed in the index but not installed are skipped.
    pub fn platforms(&self) -> &OrderedMap<Platform> {
        self.platforms.get_or_init(|| {
            let hardware_dir = self.hardware_dir();
            let mut platforms = OrderedMap::new();
            for metadata in &self.metadata.platforms {
                match Platform::if_exists(self.name(), &hardware_dir, metadata.clone()) {
                    Some(platform) => {
                        tracing::debug!(
                            "Found platform \"{}\" ({} version {})",
                            metadata.name,
                            metadata.architecture,
                            metadata.version
                        );
                        platforms.insert(metadata.architecture.clone(), platform);
                    }
                    None => {
                        tracing::info!(
                            "Missing platform \"{}\" ({} version {}). You can download this platform from {}",
                            metadata.name,
                            metadata.architecture,
                            metadata.version,
                            metadata.url.as_deref().unwrap_or("(unknown)")
                        );
                    }
                }
            }
            platforms
        })
    }

    pub fn platform(&self, architecture: &str) -> Result<&Platform, HardwareError> {
        self.platforms()
            .get(architecture)
            .ok_or_else(|| HardwareError::PlatformNotFound {
                package: self.name().to_string(),
                name: architecture.to_string(),
            })
    }

    /// Toolchains by name, each list ordered newest version first
    pub fn toolchains(&self) -> &BTreeMap<String, Vec<ToolChain>> {
        self.toolchains.get_or_init(|| {
            let mut toolchains: BTreeMap<String, Vec<ToolChain>> = BTreeMap::new();
            for metadata in &self.metadata.tools {
                toolchains
                    .entry(metadata.name.clone())
                    .or_default()
                    .push(ToolChain::new(self.name(), metadata));
            }
            for versions in toolchains.values_mut() {
                versions.sort_by(|a, b| newest_first(a.version(), b.version()));
            }
            toolchains
        })
    }

    pub fn toolchain(&self, name: &str, version: &str) -> Result<&ToolChain, HardwareError> {
        self.toolchains()
            .get(name)
            .and_then(|versions| versions.iter().find(|t| t.version() == version))
            .ok_or_else(|| HardwareError::ToolChainNotFound {
                packager: self.name().to_string(),
                name: name.to_string(),
                version: version.to_string(),
            })
    }

    /// Look up `name-version`, splitting at the last hyphen
    ///
    /// `i586-poky-linux-uclibc-1.6.2+1.0` is `i586-poky-linux-uclibc` at
    /// version `1.6.2+1.0`.
    pub fn toolchain_by_name_and_version(&self, name_and_version: &str) -> Result<&ToolChain, HardwareError> {
        let (name, version) =
            name_and_version
                .rsplit_once('-')
                .ok_or_else(|| HardwareError::NotNameAndVersion {
                    value: name_and_version.to_string(),
                })?;
        self.toolchain(name, version)
    }

    /// Newest declared release of a toolchain
    pub fn latest_toolchain(&self, name: &str) -> Option<&ToolChain> {
        self.toolchains().get(name).and_then(|versions| versions.first())
    }

    /// Newest release whose host download is installed on the search path
    pub fn latest_installed_toolchain(&self, name: &str, search: &SearchPath) -> Option<&ToolChain> {
        self.toolchains().get(name).and_then(|versions| {
            versions.iter().find(|toolchain| {
                toolchain
                    .host_toolchain()
                    .is_some_and(|host| host.exists(search))
            })
        })
    }
}

fn newest_first(a: &str, b: &str) -> Ordering {
    compare_loose(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::index::{HostSystem, PlatformMetadata, ToolChainMetadata};
    use std::fs;
    use tempfile::TempDir;

    fn tool(name: &str, version: &str) -> ToolChainMetadata {
        ToolChainMetadata {
            name: name.to_string(),
            version: version.to_string(),
            systems: vec![],
        }
    }

    fn platform(architecture: &str, version: &str) -> PlatformMetadata {
        PlatformMetadata {
            name: format!("{architecture} boards"),
            architecture: architecture.to_string(),
            version: version.to_string(),
            ..PlatformMetadata::default()
        }
    }

    fn metadata() -> PackageMetadata {
        PackageMetadata {
            name: "arduino".to_string(),
            platforms: vec![platform("avr", "1.6.9"), platform("sam", "1.6.4")],
            tools: vec![
                tool("avr-gcc", "4.8.1-arduino2"),
                tool("avr-gcc", "4.8.1-arduino5"),
                tool("avrdude", "6.0.1-arduino5"),
                tool("i586-poky-linux-uclibc", "1.6.2+1.0"),
            ],
            ..PackageMetadata::default()
        }
    }

    fn installed(root: &TempDir) -> Package {
        fs::create_dir_all(root.path().join("arduino/hardware/avr/1.6.9")).unwrap();
        Package::new(root.path(), metadata()).unwrap()
    }

    #[test]
    fn test_missing_package_directory() {
        let root = TempDir::new().unwrap();
        let err = Package::new(root.path(), metadata()).unwrap_err();
        assert!(matches!(err, HardwareError::MissingPackageDirectory { .. }));
    }

    #[test]
    fn test_uninstalled_platforms_are_skipped() {
        let root = TempDir::new().unwrap();
        let package = installed(&root);

        let architectures: Vec<&str> = package.platforms().keys().collect();
        assert_eq!(architectures, vec!["avr"]);
        assert!(matches!(
            package.platform("sam"),
            Err(HardwareError::PlatformNotFound { .. })
        ));
    }

    #[test]
    fn test_toolchain_versions_newest_first() {
        let root = TempDir::new().unwrap();
        let package = installed(&root);

        let versions: Vec<&str> = package.toolchains()["avr-gcc"]
            .iter()
            .map(ToolChain::version)
            .collect();
        assert_eq!(versions, vec!["4.8.1-arduino5", "4.8.1-arduino2"]);
        assert_eq!(
            package.latest_toolchain("avr-gcc").map(ToolChain::version),
            Some("4.8.1-arduino5")
        );
        assert!(package.latest_toolchain("bossac").is_none());
    }

    #[test]
    fn test_toolchain_by_name_and_version_splits_at_last_hyphen() {
        let root = TempDir::new().unwrap();
        let package = installed(&root);

        let poky = package
            .toolchain_by_name_and_version("i586-poky-linux-uclibc-1.6.2+1.0")
            .unwrap();
        assert_eq!(poky.name(), "i586-poky-linux-uclibc");
        assert_eq!(poky.version(), "1.6.2+1.0");

        assert!(matches!(
            package.toolchain_by_name_and_version("avrdude"),
            Err(HardwareError::NotNameAndVersion { .. })
        ));
        assert!(matches!(
            package.toolchain("avrdude", "9.9"),
            Err(HardwareError::ToolChainNotFound { .. })
        ));
    }

    #[test]
    fn test_latest_installed_toolchain() {
        let root = TempDir::new().unwrap();
        let host = crate::core::toolchain::HostInfo::current();
        let mut metadata = metadata();
        for tool in &mut metadata.tools {
            tool.systems.push(HostSystem {
                host: match (host.os.as_str(), host.machine.as_str()) {
                    ("macos", _) => "x86_64-apple-darwin".to_string(),
                    ("windows", _) => "i686-mingw32".to_string(),
                    ("linux", "aarch64") => "aarch64-linux-gnu".to_string(),
                    _ => "x86_64-pc-linux-gnu".to_string(),
                },
                url: String::new(),
                archive_file_name: None,
                checksum: None,
            });
        }
        fs::create_dir_all(root.path().join("arduino")).unwrap();
        let package = Package::new(root.path(), metadata).unwrap();
        let search = SearchPath::new(vec![root.path().to_path_buf()]);

        assert!(package.latest_installed_toolchain("avr-gcc", &search).is_none());

        let packages_root = root.path().join("packages/arduino/tools/avr-gcc/4.8.1-arduino2");
        fs::create_dir_all(&packages_root).unwrap();
        let found = package.latest_installed_toolchain("avr-gcc", &search);
        if package.latest_toolchain("avr-gcc").unwrap().host_toolchain().is_some() {
            assert_eq!(found.map(ToolChain::version), Some("4.8.1-arduino2"));
        }
    }
}
