//! Visible-text extraction.
//!
//! Pulls the body text of a parsed document with script, style and other
//! non-rendered subtrees removed, then collapses all whitespace runs to
//! single spaces. A pure function of the DOM; an empty body yields an empty
//! string.

use dom_query::Document;
use tendril::StrTendril;

/// Tags whose text content is never rendered.
const NON_VISIBLE_TAGS: &str = "script, style, noscript, template";

/// Extract the trimmed, whitespace-normalized visible text of the body.
///
/// Works on a throwaway copy of the document so the caller's DOM is left
/// untouched for later stages.
#[must_use]
pub fn extract_text(doc: &Document) -> String {
    let stripped = Document::from(doc.html().to_string());
    stripped.select(NON_VISIBLE_TAGS).remove();

    let raw: StrTendril = stripped.select("body").text();
    normalize_whitespace(&raw)
}

/// Collapse every whitespace run to a single space and trim the ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
