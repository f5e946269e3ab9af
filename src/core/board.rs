//! Boards and build-info expansion
//!
//! A [`Board`] is one record of a platform's `boards.txt`. Its build info is
//! the platform's `platform.txt` with every `{macro}` expanded, in declaration
//! order, through a resolver chain:
//!
//! 1. built-in macros (`software`, `runtime.ide.version`)
//! 2. the board's own properties
//! 3. the build info as processed so far; keys after the current one are
//!    still raw
//! 4. platform metadata from the package index (`arch` aliases the
//!    upper-cased architecture)
//! 5. for `build.*` macros, platform metadata without the `build.` prefix
//! 6. an optional caller-supplied fallback

use std::cell::OnceCell;
use std::rc::Rc;

use crate::config::defaults::PLATFORM_FILENAME;
use crate::core::keyvalue::{expand_macros, KeyValueParser};
use crate::core::platform::PlatformInfo;
use crate::core::properties::{Properties, PropertySink};
use crate::core::resolver::{BuiltinMacros, MacroResolver, PropertyLookup, ResolverChain};
use crate::error::KeyValueError;

/// One board defined by a platform
#[derive(Debug, Clone)]
pub struct Board {
    /// Board identifier, the first segment of its `boards.txt` keys
    name: String,
    properties: Properties,
    platform: Rc<PlatformInfo>,
    raw_platform_data: OnceCell<Properties>,
    build_info: OnceCell<Properties>,
}

impl Board {
    pub fn new(name: impl Into<String>, platform: Rc<PlatformInfo>) -> Self {
        Self {
            name: name.into(),
            properties: Properties::new(),
            platform,
            raw_platform_data: OnceCell::new(),
            build_info: OnceCell::new(),
        }
    }

    /// Board identifier (`uno`, `mega`, ...)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable name from the `name` property, or the identifier
    pub fn display_name(&self) -> &str {
        self.get("name").unwrap_or(&self.name)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The platform this board belongs to
    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    /// Value of `build.core`
    pub fn core_name(&self) -> Option<&str> {
        self.get("build.core")
    }

    /// Value of `build.variant`; boards without one have no variant
    pub fn variant_name(&self) -> Option<&str> {
        self.get("build.variant")
    }

    /// Unexpanded `platform.txt`, read once
    pub fn raw_platform_data(&self) -> Result<&Properties, KeyValueError> {
        if let Some(raw) = self.raw_platform_data.get() {
            return Ok(raw);
        }
        let path = self.platform.path().join(PLATFORM_FILENAME);
        let mut raw = Properties::new();
        KeyValueParser::without_menu_handler().parse_file(&path, &mut raw)?;
        tracing::debug!("Read {} keys from {}", raw.len(), path.display());
        Ok(self.raw_platform_data.get_or_init(|| raw))
    }

    /// Expand this board's build info
    ///
    /// Every call returns a fresh map; the raw platform data is shared.
    /// Unresolved macros are removed when `elide_on_miss` is set and left in
    /// place otherwise.
    pub fn process_build_info(
        &self,
        fallback: Option<&dyn MacroResolver>,
        elide_on_miss: bool,
    ) -> Result<Properties, KeyValueError> {
        let mut build = self.raw_platform_data()?.clone();

        for position in 0..build.len() {
            let expanded = {
                let Some((key, value)) = build.get_index(position) else {
                    break;
                };
                let chain = self.resolver_chain(&build, fallback);
                expand_macros(key, &chain, value, elide_on_miss)
            };
            build.set_index(position, expanded);
        }

        Ok(build)
    }

    /// Build info with no fallback and misses kept, computed once
    pub fn build_info(&self) -> Result<&Properties, KeyValueError> {
        if let Some(info) = self.build_info.get() {
            return Ok(info);
        }
        let info = self.process_build_info(None, false)?;
        Ok(self.build_info.get_or_init(|| info))
    }

    /// Forget cached build info and platform data
    pub fn invalidate_build_info(&mut self) {
        self.build_info.take();
        self.raw_platform_data.take();
    }

    fn resolver_chain<'a>(
        &'a self,
        build: &'a Properties,
        fallback: Option<&'a dyn MacroResolver>,
    ) -> ResolverChain<'a> {
        ResolverChain::new()
            .then(BuiltinMacros)
            .then(PropertyLookup(&self.properties))
            .then(PropertyLookup(build))
            .then(PlatformMetadataLookup(&self.platform))
            .then(BuildPrefixedMetadataLookup(&self.platform))
            .then_maybe(fallback)
    }
}

impl PropertySink for Board {
    fn set_property(&mut self, key: &str, value: String) {
        self.properties.insert(key, value);
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

struct PlatformMetadataLookup<'a>(&'a PlatformInfo);

impl MacroResolver for PlatformMetadataLookup<'_> {
    fn resolve(&self, _namespace: &str, macro_name: &str) -> Option<String> {
        self.0.metadata().value(macro_name)
    }
}

/// `build.foo` falls back to the platform's `foo` metadata
struct BuildPrefixedMetadataLookup<'a>(&'a PlatformInfo);

impl MacroResolver for BuildPrefixedMetadataLookup<'_> {
    fn resolve(&self, _namespace: &str, macro_name: &str) -> Option<String> {
        macro_name
            .strip_prefix("build.")
            .and_then(|name| self.0.metadata().value(name))
    }
}
