//! Metadata-enriching parse filters.
//!
//! Each configured filter sees the parsed DOM and the document's metadata
//! accumulator, in chain order. A filter that fails aborts the whole
//! document; filters that merely find nothing add nothing.

use dom_query::{Document, Selection};
use serde::Deserialize;

use crate::config::FilterSpec;
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::microdata::MicrodataFilter;

/// A pluggable metadata-enriching filter applied to each parsed document.
pub trait ParseFilter: Send + Sync {
    /// Registered name, used in configuration and error messages.
    fn name(&self) -> &'static str;

    /// Enrich `metadata` from the parsed document.
    fn filter(
        &self,
        url: &str,
        content: &[u8],
        doc: &Document,
        metadata: &mut Metadata,
    ) -> Result<()>;
}

/// Ordered chain of parse filters, built once from configuration.
#[derive(Default)]
pub struct ParseFilterChain {
    filters: Vec<Box<dyn ParseFilter>>,
}

impl ParseFilterChain {
    /// An empty chain that enriches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a chain from configured filter specs.
    ///
    /// An unknown filter name is a configuration error here, not a document
    /// error later.
    pub fn from_specs(specs: &[FilterSpec]) -> Result<Self> {
        let mut filters: Vec<Box<dyn ParseFilter>> = Vec::with_capacity(specs.len());
        for spec in specs {
            filters.push(build_filter(spec)?);
        }
        Ok(Self { filters })
    }

    /// Build a chain directly from filter instances, e.g. custom filters not
    /// in the named registry.
    #[must_use]
    pub fn from_filters(filters: Vec<Box<dyn ParseFilter>>) -> Self {
        Self { filters }
    }

    /// Run every filter in order against one document's metadata.
    pub fn filter(
        &self,
        url: &str,
        content: &[u8],
        doc: &Document,
        metadata: &mut Metadata,
    ) -> Result<()> {
        for filter in &self.filters {
            filter
                .filter(url, content, doc, metadata)
                .map_err(|e| Error::Filter {
                    name: filter.name().to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Number of configured filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Resolve one named filter spec into an instance.
fn build_filter(spec: &FilterSpec) -> Result<Box<dyn ParseFilter>> {
    match spec.name.as_str() {
        "microdata" => Ok(Box::new(MicrodataFilter::new(spec.parse_params()?))),
        "metatags" => Ok(Box::new(MetaTagsFilter::new(spec.parse_params()?))),
        other => Err(Error::Config(format!("unknown parse filter '{other}'"))),
    }
}

/// Parameters of the meta-tag parse filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetaTagsParams {
    /// Name prefixes to keep; empty keeps every named meta tag.
    pub include: Vec<String>,
}

/// Parse filter lifting `<meta name|property ... content>` pairs into
/// metadata under `meta.<name>` keys.
#[derive(Debug, Default)]
pub struct MetaTagsFilter {
    params: MetaTagsParams,
}

impl MetaTagsFilter {
    /// Build the filter with explicit parameters.
    #[must_use]
    pub fn new(params: MetaTagsParams) -> Self {
        Self { params }
    }
}

impl ParseFilter for MetaTagsFilter {
    fn name(&self) -> &'static str {
        "metatags"
    }

    fn filter(
        &self,
        _url: &str,
        _content: &[u8],
        doc: &Document,
        metadata: &mut Metadata,
    ) -> Result<()> {
        for node in doc.select("meta").nodes() {
            let meta = Selection::from(*node);
            let Some(name) = meta.attr("name").or_else(|| meta.attr("property")) else {
                continue;
            };
            let name = name.trim().to_string();
            if name.is_empty() {
                continue;
            }
            if !self.params.include.is_empty()
                && !self.params.include.iter().any(|p| name.starts_with(p.as_str()))
            {
                continue;
            }
            let Some(content) = meta.attr("content") else {
                continue;
            };
            let content = content.trim();
            if content.is_empty() {
                continue;
            }
            metadata.add_value(&format!("meta.{name}"), content);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterSpec;

    #[test]
    fn unknown_filter_name_is_a_config_error() {
        let specs = [FilterSpec::new("nonsense")];
        let err = ParseFilterChain::from_specs(&specs).err().map(|e| e.to_string());
        assert!(err.is_some_and(|m| m.contains("nonsense")));
    }

    #[test]
    fn registry_builds_known_filters() {
        let specs = [FilterSpec::new("microdata"), FilterSpec::new("metatags")];
        let chain = ParseFilterChain::from_specs(&specs).expect("known filters");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn metatags_filter_lifts_named_tags() {
        let doc = Document::from(
            r#"<html><head>
                <meta name="description" content="a page">
                <meta property="og:title" content="Title">
                <meta name="empty" content="">
                <meta charset="utf-8">
            </head><body></body></html>"#,
        );
        let filter = MetaTagsFilter::default();
        let mut metadata = Metadata::new();
        filter
            .filter("http://example.com/", &[], &doc, &mut metadata)
            .expect("metatags filter never fails");

        assert_eq!(metadata.values("meta.description"), ["a page"]);
        assert_eq!(metadata.values("meta.og:title"), ["Title"]);
        assert!(!metadata.contains_key("meta.empty"));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn metatags_include_prefixes_restrict_output() {
        let doc = Document::from(
            r#"<html><head>
                <meta name="description" content="a page">
                <meta property="og:title" content="Title">
            </head><body></body></html>"#,
        );
        let filter = MetaTagsFilter::new(MetaTagsParams {
            include: vec!["og:".to_string()],
        });
        let mut metadata = Metadata::new();
        filter
            .filter("http://example.com/", &[], &doc, &mut metadata)
            .expect("metatags filter never fails");

        assert_eq!(metadata.values("meta.og:title"), ["Title"]);
        assert!(!metadata.contains_key("meta.description"));
    }

    #[test]
    fn failing_filter_aborts_with_filter_error() {
        struct Bomb;
        impl ParseFilter for Bomb {
            fn name(&self) -> &'static str {
                "bomb"
            }
            fn filter(
                &self,
                _url: &str,
                _content: &[u8],
                _doc: &Document,
                _metadata: &mut Metadata,
            ) -> Result<()> {
                Err(Error::Parse("boom".to_string()))
            }
        }

        let chain = ParseFilterChain::from_filters(vec![Box::new(Bomb)]);
        let doc = Document::from("<html><body></body></html>");
        let mut metadata = Metadata::new();
        let err = chain.filter("http://example.com/", &[], &doc, &mut metadata);

        match err {
            Err(Error::Filter { name, message }) => {
                assert_eq!(name, "bomb");
                assert!(message.contains("boom"));
            }
            other => panic!("expected Filter error, got {other:?}"),
        }
    }
}
