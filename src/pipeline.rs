//! Per-document parse pipeline.
//!
//! One call to [`Pipeline::process`] is one all-or-nothing transaction: the
//! document moves forward through charset resolution, DOM parsing, text and
//! outlink extraction, metadata enrichment and link filtering, and comes out
//! as exactly one [`PageOutcome`]. Every document-level failure funnels into
//! the single error path that records a human-readable message under
//! [`ERROR_MESSAGE_KEY`].
//!
//! The pipeline holds only the compiled, read-only filter configuration and
//! is shared freely across workers; each invocation owns its DOM, item trees
//! and metadata exclusively and never blocks.

use std::time::Instant;

use dom_query::Document;
use log::{debug, error};
use url::Url;

use crate::config::ParserConfig;
use crate::encoding;
use crate::error::{Error, Result};
use crate::filters::link::LinkFilterChain;
use crate::filters::parse::ParseFilterChain;
use crate::metadata::Metadata;
use crate::outlinks;
use crate::result::{
    ErrorResult, FetchedPage, Outlink, PageOutcome, ParseResult, Status, ERROR_MESSAGE_KEY,
};
use crate::text;

/// Inbound metadata key carrying the fetch stage's Content-Type header.
const CONTENT_TYPE_KEY: &str = "Content-Type";

/// The compiled parse stage: filter chains plus restriction flags, loaded
/// once and shared read-only by every worker.
pub struct Pipeline {
    parse_filters: ParseFilterChain,
    link_filters: LinkFilterChain,
    transfer_keys: Option<Vec<String>>,
}

impl Pipeline {
    /// Compile a pipeline from configuration.
    ///
    /// Unknown filter names or malformed filter parameters fail here, before
    /// any document is processed.
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            parse_filters: ParseFilterChain::from_specs(&config.parse_filters)?,
            link_filters: LinkFilterChain::from_specs(
                &config.link_filters,
                config.ignore_outside_host,
                config.ignore_outside_domain,
            )?,
            transfer_keys: config.transfer_keys.clone(),
        })
    }

    /// Assemble a pipeline from already-built chains.
    #[must_use]
    pub fn from_parts(
        parse_filters: ParseFilterChain,
        link_filters: LinkFilterChain,
        transfer_keys: Option<Vec<String>>,
    ) -> Self {
        Self {
            parse_filters,
            link_filters,
            transfer_keys,
        }
    }

    /// Process one fetched page into exactly one outcome.
    #[must_use]
    pub fn process(&self, page: FetchedPage) -> PageOutcome {
        match self.run(&page) {
            Ok(result) => PageOutcome::Parsed(result),
            Err(err) => {
                error!("failed to parse {}: {err}", page.url);
                let mut metadata = page.metadata;
                metadata.set_values(ERROR_MESSAGE_KEY, vec![err.to_string()]);
                PageOutcome::Failed(ErrorResult {
                    url: page.url,
                    metadata,
                    status: Status::Error,
                })
            }
        }
    }

    fn run(&self, page: &FetchedPage) -> Result<ParseResult> {
        if page.content.is_empty() {
            return Err(Error::EmptyContent);
        }

        let start = Instant::now();

        let content_type = page.metadata.first_value_ci(CONTENT_TYPE_KEY);
        let (html, charset) = encoding::decode(&page.content, content_type);
        if html.trim().is_empty() {
            return Err(Error::Parse("decoded document is empty".to_string()));
        }

        let doc = Document::from(html.as_str());
        if !doc.select("body").exists() {
            return Err(Error::Parse("document has no body".to_string()));
        }

        let base = Url::parse(&page.url).map_err(|_| Error::InvalidUrl(page.url.clone()))?;

        let document_text = text::extract_text(&doc);
        let candidates = outlinks::extract_outlinks(&doc, &base);

        let mut metadata = page.metadata.clone();
        self.parse_filters
            .filter(&page.url, &page.content, &doc, &mut metadata)?;

        let kept = self.link_filters.apply(&base, &candidates, &metadata);

        let outlinks: Vec<Outlink> = kept
            .into_iter()
            .map(|target| Outlink::new(target, self.propagated_snapshot(&metadata)))
            .collect();

        debug!(
            "parsed {} ({}, {} outlink(s)) in {:?}",
            page.url,
            charset.name(),
            outlinks.len(),
            start.elapsed()
        );

        Ok(ParseResult {
            url: page.url.clone(),
            content: page.content.clone(),
            text: document_text,
            metadata,
            outlinks,
        })
    }

    /// The metadata snapshot propagated to one discovered outlink.
    fn propagated_snapshot(&self, metadata: &Metadata) -> Metadata {
        match &self.transfer_keys {
            None => metadata.clone(),
            Some(keys) => {
                let mut snapshot = Metadata::new();
                for key in keys {
                    let values = metadata.values(key);
                    if !values.is_empty() {
                        snapshot.add_values(key, values.to_vec());
                    }
                }
                snapshot
            }
        }
    }
}
