//! # crawlsift
//!
//! Content extraction and metadata normalization for crawler pipelines.
//!
//! crawlsift is the parse stage of a crawler: it receives already-fetched
//! page bytes, resolves the character encoding, parses a lenient HTML5 DOM,
//! extracts visible text and outbound links, runs a configured chain of
//! metadata-enriching filters (microdata flattening chief among them),
//! filters and deduplicates the outlinks, and emits exactly one success or
//! error record per document. It performs no I/O of its own.
//!
//! ## Quick Start
//!
//! ```rust
//! use crawlsift::{FetchedPage, ParserConfig, Pipeline};
//!
//! let html = br#"<html><body>
//!     <div itemscope itemtype="http://schema.org/Product">
//!         <span itemprop="name">Shoe</span>
//!     </div>
//!     <a href="/p">next page</a>
//! </body></html>"#;
//!
//! let pipeline = Pipeline::new(&ParserConfig::standard())?;
//! let outcome = pipeline.process(FetchedPage::new("http://a.com/", html.to_vec()));
//!
//! let result = outcome.parsed().ok_or("expected a parse result")?;
//! assert_eq!(result.metadata.values("microdata.product.name"), ["Shoe"]);
//! assert_eq!(result.outlink_urls().collect::<Vec<_>>(), ["http://a.com/p"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Concurrency
//!
//! A [`Pipeline`] holds only compiled, read-only configuration and can be
//! shared across any number of workers. Each `process` call owns its DOM,
//! item trees and metadata exclusively, so documents parse independently
//! with no shared mutable state.

mod error;

/// Once-loaded parser configuration.
pub mod config;

/// Pay-level (registrable) domain computation.
pub mod domain;

/// Character encoding resolution and transcoding.
pub mod encoding;

/// Pluggable parse- and link-filter chains.
pub mod filters;

/// Flat key/value metadata accumulator.
pub mod metadata;

/// Microdata item-scope discovery and flattening.
pub mod microdata;

/// Candidate outlink collection.
pub mod outlinks;

/// Per-document parse pipeline.
pub mod pipeline;

/// Input and output records of the parse stage.
pub mod result;

/// Visible-text extraction.
pub mod text;

// Public API - re-exports
pub use config::{FilterSpec, ParserConfig};
pub use error::{Error, Result};
pub use metadata::Metadata;
pub use pipeline::Pipeline;
pub use result::{
    ErrorResult, FetchedPage, Outlink, PageOutcome, ParseResult, Status, ERROR_MESSAGE_KEY,
};

/// Parse one fetched page with the standard configuration.
///
/// Convenience wrapper over [`Pipeline`] for one-off use; long-running
/// workers should build a [`Pipeline`] once and share it.
pub fn parse_page(url: impl Into<String>, content: impl Into<Vec<u8>>) -> Result<PageOutcome> {
    let pipeline = Pipeline::new(&ParserConfig::standard())?;
    Ok(pipeline.process(FetchedPage::new(url, content)))
}
