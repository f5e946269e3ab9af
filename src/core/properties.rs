//! Insertion-ordered maps used for vendor key/value data
//!
//! Vendor files (`boards.txt`, `platform.txt`, ...) are order sensitive: macro
//! expansion walks keys in declaration order. [`OrderedMap`] keeps that order
//! while still giving constant-time lookup by key.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// A string-keyed map that remembers insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

/// Ordered string-to-string mapping
pub type Properties = OrderedMap<String>;

impl<V> OrderedMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or replace a value
    ///
    /// Replacing keeps the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        if let Some(&position) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[position].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.index.get(key) {
            Some(&position) => Some(&mut self.entries[position].1),
            None => None,
        }
    }

    /// Get the value for `key`, inserting one built by `create` when absent
    pub fn get_or_insert_with(&mut self, key: &str, create: impl FnOnce() -> V) -> &mut V {
        let position = match self.index.get(key) {
            Some(&position) => position,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), create()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].1
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `position` in insertion order
    pub fn get_index(&self, position: usize) -> Option<(&str, &V)> {
        self.entries
            .get(position)
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Replace the value at `position`, keeping its key
    pub fn set_index(&mut self, position: usize, value: V) {
        if let Some(entry) = self.entries.get_mut(position) {
            entry.1 = value;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// An ordered property record that also carries an identifying name
///
/// Used for programmers and anything else grouped by the first segment of a
/// dotted key.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct NamedProperties {
    name: String,
    properties: Properties,
}

impl NamedProperties {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Properties::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl std::fmt::Display for NamedProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Anything that can absorb `key=value` pairs from the key/value parser
pub trait PropertySink {
    fn set_property(&mut self, key: &str, value: String);
}

impl PropertySink for Properties {
    fn set_property(&mut self, key: &str, value: String) {
        self.insert(key, value);
    }
}

impl PropertySink for NamedProperties {
    fn set_property(&mut self, key: &str, value: String) {
        self.properties.insert(key, value);
    }
}
