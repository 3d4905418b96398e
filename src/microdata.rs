//! Microdata item-scope discovery and flattening.
//!
//! HTML microdata (`itemscope`/`itemtype`/`itemprop`) expresses nested
//! structured entities inside a page. This module finds every top-level item
//! scope in a document, builds its property tree, and flattens the tree into
//! the flat metadata namespace an indexer consumes:
//!
//! ```text
//! <div itemscope itemtype="http://schema.org/Product">
//!   <span itemprop="name">Shoe</span>
//!   <div itemprop="offers" itemscope itemtype="http://schema.org/Offer">
//!     <span itemprop="price">10</span>
//!   </div>
//! </div>
//!
//! microdata.product.name         = ["Shoe"]
//! microdata.product.offers.price = ["10"]
//! ```
//!
//! Repeated nested occurrences of the same property either merge under one
//! prefix (values accumulate) or receive per-occurrence numbered prefixes,
//! depending on [`MicrodataParams::use_unique_prefix_for_nested_values`].
//!
//! Nothing in this module ever fails a document: a structurally bad item is
//! skipped (optionally recorded under `microdata.errors`) and extraction
//! continues with its siblings.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dom_query::{Document, Selection};
use log::debug;
use serde::Deserialize;

use crate::filters::parse::ParseFilter;
use crate::metadata::Metadata;
use crate::Result;

/// Key prefix for every flattened microdata value.
const METADATA_PREFIX: &str = "microdata.";

/// Key collecting structural error messages when enabled.
const ERRORS_KEY: &str = "microdata.errors";

/// Type segment used when an item carries no usable type URI.
const UNKNOWN_TYPE: &str = "unknown";

/// One microdata entity instance: a type URI and its named properties.
#[derive(Debug, Clone)]
pub struct ItemScope {
    /// Raw `itemtype` attribute value, if declared.
    pub item_type: Option<String>,

    /// Properties keyed by name, in document-encounter order. Each name maps
    /// to the ordered list of values declared for it within this scope.
    pub properties: Vec<(String, Vec<ItemProp>)>,
}

impl ItemScope {
    fn push_prop(&mut self, name: &str, value: ItemProp) {
        if let Some((_, values)) = self.properties.iter_mut().find(|(n, _)| n == name) {
            values.push(value);
        } else {
            self.properties.push((name.to_string(), vec![value]));
        }
    }

    /// Last path segment of the type URI, lowercased; `unknown` when the type
    /// is absent or has no path segment.
    #[must_use]
    pub fn short_type(&self) -> String {
        let Some(raw) = self.item_type.as_deref() else {
            return UNKNOWN_TYPE.to_string();
        };
        let path = match url::Url::parse(raw) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => raw.to_string(),
        };
        let segment = path.rsplit('/').next().unwrap_or_default();
        if segment.is_empty() {
            UNKNOWN_TYPE.to_string()
        } else {
            segment.to_ascii_lowercase()
        }
    }
}

/// A single value of an item property. Exactly one variant is active.
#[derive(Debug, Clone)]
pub enum ItemProp {
    /// Plain text content or attribute value.
    Scalar(String),
    /// A value with date semantics (from a `time` element).
    Date(DateTime<Utc>),
    /// A nested item scope.
    Nested(Box<ItemScope>),
}

/// Every top-level item scope found in a document, plus the structural
/// errors encountered while building them.
#[derive(Debug, Default)]
pub struct MicrodataReport {
    /// Top-level item scopes in document order.
    pub items: Vec<ItemScope>,

    /// Human-readable structural error messages.
    pub errors: Vec<String>,
}

/// Find the top-level item scopes of a document and build their trees.
///
/// A scope that is itself a property of another scope (carries `itemprop`)
/// is not listed independently; it is reached through its parent.
#[must_use]
pub fn collect_item_scopes(doc: &Document) -> MicrodataReport {
    let mut report = MicrodataReport::default();

    for node in doc.select("[itemscope]").nodes() {
        let scope = Selection::from(*node);
        if scope.has_attr("itemprop") {
            continue;
        }
        let item = build_scope(&scope, &mut report.errors);
        report.items.push(item);
    }

    report
}

/// Build the property tree of one item scope.
fn build_scope(scope: &Selection, errors: &mut Vec<String>) -> ItemScope {
    let mut item = ItemScope {
        item_type: scope
            .attr("itemtype")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        properties: Vec::new(),
    };

    for child in child_elements(scope) {
        collect_props(&child, &mut item, errors);
    }

    item
}

/// Walk one element of a scope's subtree, recording any properties it
/// declares, without crossing into nested scopes' subtrees.
fn collect_props(el: &Selection, item: &mut ItemScope, errors: &mut Vec<String>) {
    let prop_names: Vec<String> = el
        .attr("itemprop")
        .map(|raw| raw.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let is_scope = el.has_attr("itemscope");

    if !prop_names.is_empty() {
        if is_scope {
            let nested = build_scope(el, errors);
            for name in &prop_names {
                item.push_prop(name, ItemProp::Nested(Box::new(nested.clone())));
            }
        } else if let Some(value) = property_value(el, errors) {
            for name in &prop_names {
                item.push_prop(name, value.clone());
            }
        }
    }

    if is_scope {
        // A nested scope owns its subtree, whether it is a property of this
        // item or an independent top-level item.
        return;
    }

    for child in child_elements(el) {
        collect_props(&child, item, errors);
    }
}

/// Direct element children of a single-node selection.
fn child_elements<'a>(sel: &Selection<'a>) -> Vec<Selection<'a>> {
    sel.children()
        .nodes()
        .iter()
        .filter(|node| node.is_element())
        .map(|node| Selection::from(*node))
        .collect()
}

/// The microdata value of a non-scope property element, per the HTML
/// microdata value rules. Absent or empty values yield `None`.
fn property_value(el: &Selection, errors: &mut Vec<String>) -> Option<ItemProp> {
    let tag = el
        .nodes()
        .first()
        .and_then(dom_query::NodeRef::node_name)
        .map(|t| t.to_string())?;

    let value = match tag.as_str() {
        "meta" => attr_value(el, "content"),
        "img" | "audio" | "embed" | "iframe" | "source" | "track" | "video" => {
            attr_value(el, "src")
        }
        "a" | "area" | "link" => attr_value(el, "href"),
        "object" => attr_value(el, "data"),
        "data" | "meter" => attr_value(el, "value"),
        "time" => return time_value(el, errors),
        _ => text_value(el),
    };

    value.map(ItemProp::Scalar)
}

fn attr_value(el: &Selection, name: &str) -> Option<String> {
    el.attr(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn text_value(el: &Selection) -> Option<String> {
    let text = el.text().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// A `time` element's value: the `datetime` attribute (falling back to the
/// text content) parsed as a date. A value that fails to parse is recorded
/// as a structural error and kept as a scalar so the property is not lost.
fn time_value(el: &Selection, errors: &mut Vec<String>) -> Option<ItemProp> {
    let raw = attr_value(el, "datetime").or_else(|| text_value(el))?;
    match parse_date(&raw) {
        Some(date) => Some(ItemProp::Date(date)),
        None => {
            errors.push(format!("invalid date value '{raw}' in time element"));
            Some(ItemProp::Scalar(raw))
        }
    }
}

/// Parse the datetime formats found in the wild on `time` elements.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(date.and_utc());
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(date.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// Parameters of the microdata parse filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MicrodataParams {
    /// Append structural error messages to `microdata.errors`.
    #[serde(rename = "includeErrors")]
    pub include_errors: bool,

    /// Give each repeated nested occurrence of a property its own numbered
    /// prefix segment instead of merging all occurrences under one prefix.
    ///
    /// Counters are 0-based, per property name, per scope: the first nested
    /// `offers` value of a product flattens under `...offers.0.`, the second
    /// under `...offers.1.`, independently of counters in any other scope.
    #[serde(rename = "useUniquePrefixForNestedValues")]
    pub use_unique_prefix_for_nested_values: bool,
}

/// Parse filter flattening microdata item trees into document metadata.
#[derive(Debug, Default)]
pub struct MicrodataFilter {
    params: MicrodataParams,
}

impl MicrodataFilter {
    /// Build the filter with explicit parameters.
    #[must_use]
    pub fn new(params: MicrodataParams) -> Self {
        Self { params }
    }

    /// Flatten one scope's properties into metadata under `prefix`.
    fn flatten_scope(&self, scope: &ItemScope, prefix: &str, metadata: &mut Metadata) {
        // Occurrence counters for repeated nested properties, scoped to this
        // item only.
        let mut nested_counters: HashMap<&str, usize> = HashMap::new();

        for (name, props) in &scope.properties {
            let mut values = Vec::new();
            for prop in props {
                match prop {
                    ItemProp::Nested(nested) => {
                        let mut child_prefix = format!("{prefix}{name}.");
                        if self.params.use_unique_prefix_for_nested_values {
                            let counter = nested_counters.entry(name.as_str()).or_insert(0);
                            let _ = write!(child_prefix, "{}.", *counter);
                            *counter += 1;
                        }
                        self.flatten_scope(nested, &child_prefix, metadata);
                    }
                    ItemProp::Date(date) => values.push(date.timestamp_millis().to_string()),
                    ItemProp::Scalar(text) => values.push(text.clone()),
                }
            }
            metadata.add_values(&format!("{prefix}{name}"), values);
        }
    }
}

impl ParseFilter for MicrodataFilter {
    fn name(&self) -> &'static str {
        "microdata"
    }

    fn filter(
        &self,
        url: &str,
        _content: &[u8],
        doc: &Document,
        metadata: &mut Metadata,
    ) -> Result<()> {
        let report = collect_item_scopes(doc);

        for item in &report.items {
            let prefix = format!("{METADATA_PREFIX}{}.", item.short_type());
            self.flatten_scope(item, &prefix, metadata);
        }

        if !report.errors.is_empty() {
            debug!("{} microdata item error(s) on {url}", report.errors.len());
            if self.params.include_errors {
                metadata.add_values(ERRORS_KEY, report.errors);
            }
        }

        Ok(())
    }
}
