//! Flat key/value metadata accumulator.
//!
//! `Metadata` is the mutable accumulator threaded through one document's
//! processing: an ordered mapping from string key to a list of string values.
//! Values append in insertion order and are never overwritten unless a caller
//! explicitly replaces a key. Iteration order is deterministic, so processing
//! the same document twice yields identical metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered multimap of string keys to repeatable string values.
///
/// Keys are case-sensitive and never empty; adding under an empty key is a
/// no-op. Adding an empty value list is likewise a no-op, so absent values
/// never leave an empty entry behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(flatten)]
    entries: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    /// Create an empty metadata accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single value under `key`.
    pub fn add_value(&mut self, key: &str, value: impl Into<String>) {
        if key.is_empty() {
            return;
        }
        self.entries.entry(key.to_string()).or_default().push(value.into());
    }

    /// Append every value in `values` under `key`, preserving their order.
    ///
    /// An empty `values` list leaves the metadata untouched.
    pub fn add_values(&mut self, key: &str, values: Vec<String>) {
        if key.is_empty() || values.is_empty() {
            return;
        }
        self.entries.entry(key.to_string()).or_default().extend(values);
    }

    /// Replace whatever is stored under `key` with `values`.
    ///
    /// An empty `values` list removes the key entirely.
    pub fn set_values(&mut self, key: &str, values: Vec<String>) {
        if key.is_empty() {
            return;
        }
        if values.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries.insert(key.to_string(), values);
        }
    }

    /// First value stored under `key`, if any.
    #[must_use]
    pub fn first_value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// First value stored under a key matching `key` case-insensitively.
    ///
    /// Header-derived keys like `Content-Type` arrive with whatever casing the
    /// fetch stage recorded.
    #[must_use]
    pub fn first_value_ci(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }

    /// All values stored under `key`, in insertion order.
    #[must_use]
    pub fn values(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over all `(key, values)` entries in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterate over all keys in deterministic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (key, values) in iter {
            metadata.add_values(&key, values);
        }
        metadata
    }
}
