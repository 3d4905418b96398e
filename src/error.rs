//! Error types for crawlsift.
//!
//! This module defines the document-level failure modes of the parse
//! pipeline. Per-link and per-item problems are absorbed where they occur
//! and deliberately have no variant here.

/// Error type for document processing operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The fetched document carried no content bytes.
    #[error("empty document content")]
    EmptyContent,

    /// The document could not be parsed into a usable DOM.
    #[error("HTML parsing failed: {0}")]
    Parse(String),

    /// A configured parse filter failed during metadata enrichment.
    #[error("parse filter '{name}' failed: {message}")]
    Filter {
        /// Registered name of the failing filter.
        name: String,
        /// The filter's own error message.
        message: String,
    },

    /// The source URL of the document could not be parsed.
    #[error("invalid source URL: {0}")]
    InvalidUrl(String),

    /// Filter-chain configuration was malformed or referenced an unknown filter.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for document processing operations.
pub type Result<T> = std::result::Result<T, Error>;
