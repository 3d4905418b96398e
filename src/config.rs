//! Once-loaded parser configuration.
//!
//! The filter chains are described by a single JSON document shaped like:
//!
//! ```json
//! {
//!   "parse_filters": [
//!     { "name": "microdata", "params": { "useUniquePrefixForNestedValues": true } }
//!   ],
//!   "link_filters": [
//!     { "name": "basic" },
//!     { "name": "regex", "params": { "rules": ["-\\.(gif|jpg|png)$", "+."] } }
//!   ],
//!   "ignore_outside_host": false,
//!   "ignore_outside_domain": true
//! }
//! ```
//!
//! The configuration is loaded once at startup, compiled into immutable
//! chains, and shared read-only by every worker.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Complete parse-stage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Ordered metadata-enriching filters applied to each parsed document.
    pub parse_filters: Vec<FilterSpec>,

    /// Ordered predicate/transform filters applied to each candidate outlink.
    pub link_filters: Vec<FilterSpec>,

    /// Drop outlinks whose host differs from the source host.
    pub ignore_outside_host: bool,

    /// Drop outlinks whose pay-level domain differs from the source's.
    pub ignore_outside_domain: bool,

    /// Metadata keys copied onto discovered outlinks.
    ///
    /// `None` propagates the full metadata snapshot; a list restricts the
    /// snapshot to those keys.
    pub transfer_keys: Option<Vec<String>>,
}

impl ParserConfig {
    /// Parse a configuration document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration document from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// The standard chain: microdata enrichment and basic link hygiene, no
    /// host/domain restrictions.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            parse_filters: vec![FilterSpec::new("microdata")],
            link_filters: vec![FilterSpec::new("basic")],
            ..Self::default()
        }
    }
}

/// One named filter plus its parameter object.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSpec {
    /// Registered filter name.
    pub name: String,

    /// Filter-specific parameters; absent means defaults.
    #[serde(default)]
    pub params: Value,
}

impl FilterSpec {
    /// A spec with default parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), params: Value::Null }
    }

    /// A spec carrying an explicit parameter object.
    #[must_use]
    pub fn with_params(name: impl Into<String>, params: Value) -> Self {
        Self { name: name.into(), params }
    }

    /// Deserialize this spec's parameters into a typed parameter struct.
    pub(crate) fn parse_params<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.params.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.params.clone())
            .map_err(|e| Error::Config(format!("filter '{}' params: {e}", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_off() {
        let config = ParserConfig::default();
        assert!(config.parse_filters.is_empty());
        assert!(config.link_filters.is_empty());
        assert!(!config.ignore_outside_host);
        assert!(!config.ignore_outside_domain);
        assert!(config.transfer_keys.is_none());
    }

    #[test]
    fn parses_full_document() {
        let config = ParserConfig::from_json_str(
            r#"{
                "parse_filters": [
                    { "name": "microdata", "params": { "includeErrors": true } }
                ],
                "link_filters": [ { "name": "basic" } ],
                "ignore_outside_domain": true,
                "transfer_keys": ["depth"]
            }"#,
        )
        .expect("valid config");

        assert_eq!(config.parse_filters.len(), 1);
        assert_eq!(config.parse_filters[0].name, "microdata");
        assert_eq!(config.link_filters.len(), 1);
        assert!(config.ignore_outside_domain);
        assert!(!config.ignore_outside_host);
        assert_eq!(config.transfer_keys.as_deref(), Some(&["depth".to_string()][..]));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(ParserConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn missing_params_parse_as_defaults() {
        #[derive(Default, Deserialize)]
        struct P {
            flag: bool,
        }

        let spec = FilterSpec::new("x");
        let params: P = spec.parse_params().expect("defaults");
        assert!(!params.flag);
    }
}
