//! Input and output records of the parse stage.
//!
//! A document enters as a [`FetchedPage`] and leaves as exactly one
//! [`PageOutcome`]: either a [`ParseResult`] with text, metadata and kept
//! outlinks, or an [`ErrorResult`] carrying the failure message — never both,
//! never neither.

use serde::Serialize;

use crate::metadata::Metadata;

/// Metadata key carrying the human-readable failure message of an
/// [`ErrorResult`].
pub const ERROR_MESSAGE_KEY: &str = "errorMessage";

/// A fetched page handed to the parse stage: raw bytes, source URL and the
/// metadata accumulated by earlier crawl stages.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Source URL the bytes were fetched from.
    pub url: String,

    /// Raw response body.
    pub content: Vec<u8>,

    /// Inbound metadata (headers, crawl bookkeeping) from the fetch stage.
    pub metadata: Metadata,
}

impl FetchedPage {
    /// A page with empty inbound metadata.
    #[must_use]
    pub fn new(url: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// A page carrying inbound metadata from the fetch stage.
    #[must_use]
    pub fn with_metadata(
        url: impl Into<String>,
        content: impl Into<Vec<u8>>,
        metadata: Metadata,
    ) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            metadata,
        }
    }
}

/// Crawl status marker attached to records routed to the status stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// A newly discovered outlink, candidate for a future fetch.
    Discovered,
    /// A terminally failed document.
    Error,
}

/// A kept outlink: the resolved absolute target plus the metadata snapshot to
/// propagate to it.
///
/// The snapshot is an owned copy; later mutation of the parent document's
/// metadata is never observable through it.
#[derive(Debug, Clone)]
pub struct Outlink {
    /// Absolute target URL.
    pub url: String,

    /// Metadata propagated to the target.
    pub metadata: Metadata,

    /// Always [`Status::Discovered`].
    pub status: Status,
}

impl Outlink {
    pub(crate) fn new(url: String, metadata: Metadata) -> Self {
        Self {
            url,
            metadata,
            status: Status::Discovered,
        }
    }
}

/// Successful outcome of parsing one document.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Source URL of the document.
    pub url: String,

    /// Raw fetched bytes, passed through for downstream consumers.
    pub content: Vec<u8>,

    /// Trimmed, whitespace-normalized visible text.
    pub text: String,

    /// Final metadata after the whole parse-filter chain ran.
    pub metadata: Metadata,

    /// Kept outlinks, unique by target URL.
    pub outlinks: Vec<Outlink>,
}

impl ParseResult {
    /// The kept target URLs in deterministic order.
    pub fn outlink_urls(&self) -> impl Iterator<Item = &str> {
        self.outlinks.iter().map(|o| o.url.as_str())
    }
}

/// Terminal failure outcome of parsing one document.
#[derive(Debug, Clone)]
pub struct ErrorResult {
    /// Source URL of the document.
    pub url: String,

    /// Metadata carrying [`ERROR_MESSAGE_KEY`].
    pub metadata: Metadata,

    /// Always [`Status::Error`].
    pub status: Status,
}

impl ErrorResult {
    /// The recorded failure message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.metadata.first_value(ERROR_MESSAGE_KEY)
    }
}

/// Exactly one of these is produced per document.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    /// The document parsed; text, metadata and outlinks are final.
    Parsed(ParseResult),
    /// The document failed; the error message is in the metadata.
    Failed(ErrorResult),
}

impl PageOutcome {
    /// Whether this outcome is a [`ParseResult`].
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// Unwrap into the success record, if any.
    #[must_use]
    pub fn parsed(self) -> Option<ParseResult> {
        match self {
            Self::Parsed(result) => Some(result),
            Self::Failed(_) => None,
        }
    }

    /// Unwrap into the failure record, if any.
    #[must_use]
    pub fn failed(self) -> Option<ErrorResult> {
        match self {
            Self::Parsed(_) => None,
            Self::Failed(result) => Some(result),
        }
    }
}
