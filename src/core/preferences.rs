//! User preferences
//!
//! The first of `preferences.txt`, `arturo.ini` or `.anorc` found on the
//! search path is read as a flat key/value file the first time a preference
//! is requested.

use std::cell::OnceCell;
use std::path::PathBuf;

use crate::config::defaults::PREFERENCE_FILE_NAMES;
use crate::core::keyvalue::KeyValueParser;
use crate::core::properties::Properties;
use crate::error::ArturoError;
use crate::infra::search_path::SearchPath;

#[derive(Debug)]
pub struct Preferences {
    search: SearchPath,
    prefs: OnceCell<Properties>,
}

impl Preferences {
    pub fn new(search: SearchPath) -> Self {
        Self {
            search,
            prefs: OnceCell::new(),
        }
    }

    /// Location of the preferences file
    pub fn path(&self) -> Result<PathBuf, ArturoError> {
        Ok(self
            .search
            .find_first_file_of_name_or_throw(PREFERENCE_FILE_NAMES, "preferences file")?)
    }

    /// All preferences, loaded on first access
    pub fn all(&self) -> Result<&Properties, ArturoError> {
        if let Some(prefs) = self.prefs.get() {
            return Ok(prefs);
        }
        let path = self.path()?;
        let mut prefs = Properties::new();
        KeyValueParser::without_menu_handler().parse_file(&path, &mut prefs)?;
        tracing::debug!("Loaded {} preferences from {}", prefs.len(), path.display());
        Ok(self.prefs.get_or_init(|| prefs))
    }

    /// Value for `key`, or `default` when unset
    pub fn get(&self, key: &str, default: Option<&str>) -> Result<Option<String>, ArturoError> {
        Ok(self
            .all()?
            .get(key)
            .map(String::as_str)
            .or(default)
            .map(ToString::to_string))
    }
}
