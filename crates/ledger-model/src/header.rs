//! Original → normalized header mapping.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Ordered mapping from each header as written in the source file to its
/// normalized column name. Insertion order follows the file's column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the mapping for `original`.
    ///
    /// Replacing keeps the original position.
    pub fn insert(&mut self, original: impl Into<String>, normalized: impl Into<String>) {
        let original = original.into();
        let normalized = normalized.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == original) {
            entry.1 = normalized;
        } else {
            self.entries.push((original, normalized));
        }
    }

    /// Normalized name for an original header.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == original)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_original(&self, original: &str) -> bool {
        self.get(original).is_some()
    }

    /// Normalized names in column order.
    pub fn normalized(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as a JSON object, keys in column order.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (original, normalized) in &self.entries {
            map.serialize_entry(original, normalized)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (original, normalized) in iter {
            map.insert(original, normalized);
        }
        map
    }
}
