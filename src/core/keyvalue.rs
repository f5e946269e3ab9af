//! Arduino15 `key=value` files and `{macro}` expansion
//!
//! Parses the line-oriented vendor files (`boards.txt`, `platform.txt`,
//! `programmers.txt`, `library.properties`, `preferences.txt`) into ordered
//! maps, and expands `{dotted.key}` macros in their values.
//!
//! # Grouping
//!
//! Parsed flat, every key is stored verbatim. Parsed with a factory, a dotted
//! key `uno.build.mcu` is split at its first dot: `uno` names a record created
//! on first sight and `build.mcu` is stored inside it. Keys without a dot are
//! kept flat next to the records ([`ParsedEntry::Value`]).

use std::path::Path;

use crate::core::properties::{OrderedMap, PropertySink};
use crate::core::resolver::MacroResolver;
use crate::error::KeyValueError;

/// Intercepts lines before they are stored
pub trait MenuHandler {
    /// Return `true` to drop the line
    fn handle_line(&self, line: &str, key: &str, value: &str) -> bool;
}

/// Drops every `menu.` definition line
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardMenuHandler;

impl MenuHandler for DiscardMenuHandler {
    fn handle_line(&self, _line: &str, key: &str, _value: &str) -> bool {
        key.starts_with("menu.")
    }
}

/// One top-level entry of a grouped parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEntry<T> {
    /// Record built from dotted keys sharing a first segment
    Group(T),
    /// Undotted key stored as-is
    Value(String),
}

impl<T> ParsedEntry<T> {
    pub fn as_group(&self) -> Option<&T> {
        match self {
            Self::Group(group) => Some(group),
            Self::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            Self::Group(_) => None,
            Self::Value(value) => Some(value),
        }
    }
}

/// Parser for Arduino15 key/value documents
pub struct KeyValueParser<'a> {
    menu_handler: Option<&'a dyn MenuHandler>,
}

static DISCARD_MENUS: DiscardMenuHandler = DiscardMenuHandler;

impl Default for KeyValueParser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> KeyValueParser<'a> {
    /// Parser that discards `menu.` lines
    pub fn new() -> Self {
        Self {
            menu_handler: Some(&DISCARD_MENUS),
        }
    }

    /// Parser that keeps every line
    pub fn without_menu_handler() -> Self {
        Self { menu_handler: None }
    }

    pub fn with_menu_handler(handler: &'a dyn MenuHandler) -> Self {
        Self {
            menu_handler: Some(handler),
        }
    }

    /// Parse a file, storing every key verbatim into `target`
    pub fn parse_file<S: PropertySink + ?Sized>(
        &self,
        path: &Path,
        target: &mut S,
    ) -> Result<(), KeyValueError> {
        let content = read(path)?;
        self.parse_str(path, &content, target)
    }

    /// Parse `content` (read from `origin`) into `target`
    pub fn parse_str<S: PropertySink + ?Sized>(
        &self,
        origin: &Path,
        content: &str,
        target: &mut S,
    ) -> Result<(), KeyValueError> {
        self.for_each_pair(origin, content, |key, value| {
            target.set_property(key, value);
        })
    }

    /// Parse a file, grouping dotted keys into records made by `factory`
    pub fn parse_file_grouped<T, F>(
        &self,
        path: &Path,
        target: &mut OrderedMap<ParsedEntry<T>>,
        factory: F,
    ) -> Result<(), KeyValueError>
    where
        T: PropertySink,
        F: FnMut(&str) -> T,
    {
        let content = read(path)?;
        self.parse_str_grouped(path, &content, target, factory)
    }

    pub fn parse_str_grouped<T, F>(
        &self,
        origin: &Path,
        content: &str,
        target: &mut OrderedMap<ParsedEntry<T>>,
        mut factory: F,
    ) -> Result<(), KeyValueError>
    where
        T: PropertySink,
        F: FnMut(&str) -> T,
    {
        self.for_each_pair(origin, content, |key, value| {
            let Some((group_name, remainder)) = key.split_once('.') else {
                if let Some(ParsedEntry::Group(_)) = target.get(key) {
                    tracing::warn!("{}: value for '{}' replaces a group", origin.display(), key);
                }
                target.insert(key, ParsedEntry::Value(value));
                return;
            };

            if let Some(ParsedEntry::Value(_)) = target.get(group_name) {
                tracing::warn!(
                    "{}: group '{}' replaces a plain value",
                    origin.display(),
                    group_name
                );
                target.insert(group_name, ParsedEntry::Group(factory(group_name)));
            }
            let entry =
                target.get_or_insert_with(group_name, || ParsedEntry::Group(factory(group_name)));
            if let ParsedEntry::Group(group) = entry {
                group.set_property(remainder, value);
            }
        })
    }

    fn for_each_pair<F>(&self, origin: &Path, content: &str, mut store: F) -> Result<(), KeyValueError>
    where
        F: FnMut(&str, String),
    {
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                tracing::trace!("Skipping empty line");
                continue;
            }
            if line.trim_start().starts_with('#') {
                tracing::trace!("Skipping comment {}", line);
                continue;
            }

            let Some((raw_key, raw_value)) = line.split_once('=') else {
                return Err(KeyValueError::MalformedLine {
                    path: origin.to_path_buf(),
                    line_number: index + 1,
                    line: line.to_string(),
                });
            };
            let key = raw_key.trim_start();
            let value = raw_value.trim_end();

            if let Some(handler) = self.menu_handler {
                if handler.handle_line(line, key, value) {
                    tracing::trace!("Found menu definition {}={}", key, value);
                    continue;
                }
            }

            store(key, value.to_string());
        }
        Ok(())
    }
}

fn read(path: &Path) -> Result<String, KeyValueError> {
    std::fs::read_to_string(path).map_err(|e| KeyValueError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Locate the next `{macro}` token at or after byte offset `from`
///
/// Braces preceded by a backslash are literal. The macro name may not contain
/// whitespace. Returns the token's byte range and the name between the braces.
fn find_macro(raw: &str, from: usize) -> Option<(usize, usize, &str)> {
    let bytes = raw.as_bytes();
    let mut search = from;

    while let Some(relative) = raw[search..].find('{') {
        let open = search + relative;
        search = open + 1;
        if open > 0 && bytes[open - 1] == b'\\' {
            continue;
        }

        let body_start = open + 1;
        for (offset, ch) in raw[body_start..].char_indices() {
            if ch == '}' {
                let close = body_start + offset;
                if bytes[close - 1] != b'\\' {
                    return Some((open, close + 1, &raw[body_start..close]));
                }
            } else if ch.is_whitespace() {
                break;
            }
        }
    }
    None
}

/// Expand every `{macro}` token in `raw_value` using `resolver`
///
/// A token the resolver cannot resolve is removed when `elide_on_miss` is set
/// and left untouched otherwise. Replacements are not rescanned.
pub fn expand_macros<R: MacroResolver + ?Sized>(
    namespace: &str,
    resolver: &R,
    raw_value: &str,
    elide_on_miss: bool,
) -> String {
    let mut output = String::with_capacity(raw_value.len());
    let mut last_end = 0;

    while let Some((start, end, name)) = find_macro(raw_value, last_end) {
        output.push_str(&raw_value[last_end..start]);
        match resolver.resolve(namespace, name) {
            Some(expansion) => {
                tracing::trace!("found macro \"{}\" => \"{}\"", name, expansion);
                output.push_str(&expansion);
            }
            None => {
                tracing::trace!("found macro \"{}\" => [no value]", name);
                if !elide_on_miss {
                    output.push_str(&raw_value[start..end]);
                }
            }
        }
        last_end = end;
    }

    output.push_str(&raw_value[last_end..]);
    tracing::trace!("    raw      = {}", raw_value);
    tracing::trace!("    expanded = {}", output);
    output
}
