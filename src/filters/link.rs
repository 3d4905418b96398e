//! Outlink filtering.
//!
//! Candidate outlinks pass through the configured filters in order; any
//! filter may rewrite the URL or drop it, and a drop short-circuits the rest
//! of the chain for that link. After the generic chain, the optional host and
//! domain restrictions apply. Survivors are deduplicated again, since two
//! different candidates may rewrite to the same URL.

use std::collections::BTreeSet;

use log::debug;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::config::FilterSpec;
use crate::domain::pay_level_domain;
use crate::error::{Error, Result};
use crate::metadata::Metadata;

/// A pluggable predicate/transform applied to each candidate outlink.
pub trait LinkFilter: Send + Sync {
    /// Registered name, used in configuration and error messages.
    fn name(&self) -> &'static str;

    /// The (possibly rewritten) URL to keep, or `None` to drop the link.
    fn filter(&self, source: &Url, target: &str, metadata: &Metadata) -> Option<String>;
}

/// Ordered chain of link filters plus the host/domain restrictions, built
/// once from configuration.
#[derive(Default)]
pub struct LinkFilterChain {
    filters: Vec<Box<dyn LinkFilter>>,
    ignore_outside_host: bool,
    ignore_outside_domain: bool,
}

impl LinkFilterChain {
    /// Build a chain from configured filter specs and restriction flags.
    pub fn from_specs(
        specs: &[FilterSpec],
        ignore_outside_host: bool,
        ignore_outside_domain: bool,
    ) -> Result<Self> {
        let mut filters: Vec<Box<dyn LinkFilter>> = Vec::with_capacity(specs.len());
        for spec in specs {
            filters.push(build_filter(spec)?);
        }
        Ok(Self {
            filters,
            ignore_outside_host,
            ignore_outside_domain,
        })
    }

    /// Build a chain directly from filter instances.
    #[must_use]
    pub fn from_filters(
        filters: Vec<Box<dyn LinkFilter>>,
        ignore_outside_host: bool,
        ignore_outside_domain: bool,
    ) -> Self {
        Self {
            filters,
            ignore_outside_host,
            ignore_outside_domain,
        }
    }

    /// Filter every candidate and return the deduplicated kept set.
    #[must_use]
    pub fn apply(
        &self,
        source: &Url,
        candidates: &BTreeSet<String>,
        metadata: &Metadata,
    ) -> BTreeSet<String> {
        let from_host = source.host_str().unwrap_or_default().to_ascii_lowercase();
        let from_domain = pay_level_domain(&from_host);

        let mut kept = BTreeSet::new();

        'candidates: for candidate in candidates {
            let mut target = candidate.clone();

            for filter in &self.filters {
                match filter.filter(source, &target, metadata) {
                    Some(rewritten) => target = rewritten,
                    None => {
                        debug!("filter '{}' dropped {target}", filter.name());
                        continue 'candidates;
                    }
                }
            }

            if self.ignore_outside_host || self.ignore_outside_domain {
                let Ok(parsed) = Url::parse(&target) else {
                    debug!("dropping unparseable rewritten link {target}");
                    continue;
                };
                let to_host = parsed.host_str().unwrap_or_default();

                if self.ignore_outside_host && !to_host.eq_ignore_ascii_case(&from_host) {
                    continue;
                }

                if self.ignore_outside_domain {
                    let to_domain = pay_level_domain(to_host);
                    match (&from_domain, &to_domain) {
                        (Some(from), Some(to)) if from == to => {}
                        _ => continue,
                    }
                }
            }

            kept.insert(target);
        }

        kept
    }
}

/// Resolve one named filter spec into an instance.
fn build_filter(spec: &FilterSpec) -> Result<Box<dyn LinkFilter>> {
    match spec.name.as_str() {
        "basic" => Ok(Box::new(BasicLinkFilter::new(spec.parse_params()?))),
        "regex" => Ok(Box::new(RegexLinkFilter::from_params(spec.parse_params()?)?)),
        other => Err(Error::Config(format!("unknown link filter '{other}'"))),
    }
}

/// Parameters of the basic link filter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BasicLinkParams {
    /// Maximum accepted URL length.
    pub max_length: usize,

    /// Strip fragment identifiers before keeping a link.
    pub strip_fragments: bool,
}

impl Default for BasicLinkParams {
    fn default() -> Self {
        Self {
            max_length: 1024,
            strip_fragments: true,
        }
    }
}

/// Baseline link hygiene: http(s) only, fragments stripped, oversized URLs
/// dropped.
#[derive(Debug, Default)]
pub struct BasicLinkFilter {
    params: BasicLinkParams,
}

impl BasicLinkFilter {
    /// Build the filter with explicit parameters.
    #[must_use]
    pub fn new(params: BasicLinkParams) -> Self {
        Self { params }
    }
}

impl LinkFilter for BasicLinkFilter {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn filter(&self, _source: &Url, target: &str, _metadata: &Metadata) -> Option<String> {
        let mut url = Url::parse(target).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        if self.params.strip_fragments && url.fragment().is_some() {
            url.set_fragment(None);
        }
        let rewritten: String = url.into();
        if rewritten.len() > self.params.max_length {
            return None;
        }
        Some(rewritten)
    }
}

/// Parameters of the regex link filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegexLinkParams {
    /// Ordered rules, each `+pattern` (keep) or `-pattern` (drop). The first
    /// matching rule decides; a link matching no rule is kept.
    pub rules: Vec<String>,
}

/// Ordered keep/drop regex rules.
pub struct RegexLinkFilter {
    rules: Vec<(bool, Regex)>,
}

impl RegexLinkFilter {
    /// Compile the configured rules.
    pub fn from_params(params: RegexLinkParams) -> Result<Self> {
        let mut rules = Vec::with_capacity(params.rules.len());
        for rule in &params.rules {
            let (keep, pattern) = match rule.split_at_checked(1) {
                Some(("+", pattern)) => (true, pattern),
                Some(("-", pattern)) => (false, pattern),
                _ => {
                    return Err(Error::Config(format!(
                        "regex link filter rule must start with '+' or '-': '{rule}'"
                    )))
                }
            };
            let compiled = Regex::new(pattern)
                .map_err(|e| Error::Config(format!("regex link filter rule '{rule}': {e}")))?;
            rules.push((keep, compiled));
        }
        Ok(Self { rules })
    }
}

impl LinkFilter for RegexLinkFilter {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn filter(&self, _source: &Url, target: &str, _metadata: &Metadata) -> Option<String> {
        for (keep, pattern) in &self.rules {
            if pattern.is_match(target) {
                return keep.then(|| target.to_string());
            }
        }
        Some(target.to_string())
    }
}
