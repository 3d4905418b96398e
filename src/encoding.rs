//! Character encoding resolution and transcoding.
//!
//! Resolves the text encoding of fetched page bytes from three signals: the
//! Content-Type header recorded by the fetch stage, the byte content itself,
//! and charset declarations in the document head. Byte evidence outranks the
//! transport hint when the two disagree. Resolution never fails a document;
//! the worst case is a mis-decoded page.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// Match a `charset=` parameter inside a Content-Type header value.
#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).expect("valid regex")
});

/// Match `<meta charset="...">` tag
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">` tag
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#).expect("valid regex")
});

/// Extract an encoding hint from a Content-Type header value.
///
/// A malformed or charset-less header yields no hint; it is never an error.
#[must_use]
pub fn header_charset_hint(content_type: &str) -> Option<&'static Encoding> {
    HEADER_CHARSET_RE
        .captures(content_type)
        .and_then(|c| c.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
}

/// Resolve the character encoding of raw page bytes.
///
/// Evidence is weighed in this order:
/// 1. A byte-order mark is decisive.
/// 2. Non-ASCII bytes that form valid UTF-8 decide for UTF-8, even against a
///    conflicting header hint (a declared legacy charset is frequently wrong
///    on real pages, valid multi-byte UTF-8 almost never is).
/// 3. A `<meta charset>` or `http-equiv` declaration in the first 1024 bytes.
/// 4. The header hint, if any.
/// 5. UTF-8, the web default.
#[must_use]
pub fn resolve_charset(content: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(content) {
        return encoding;
    }

    if !content.is_ascii() && std::str::from_utf8(content).is_ok() {
        return UTF_8;
    }

    if let Some(encoding) = sniff_meta_charset(content) {
        return encoding;
    }

    content_type.and_then(header_charset_hint).unwrap_or(UTF_8)
}

/// Detect a charset declaration in the document head.
///
/// Only examines the first 1024 bytes for performance.
fn sniff_meta_charset(content: &[u8]) -> Option<&'static Encoding> {
    let head = &content[..content.len().min(1024)];
    let head_str = String::from_utf8_lossy(head);

    if let Some(charset) = CHARSET_META_RE
        .captures(&head_str)
        .and_then(|c| c.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
    {
        return Some(charset);
    }

    CONTENT_TYPE_CHARSET_RE
        .captures(&head_str)
        .and_then(|c| c.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
}

/// Decode page bytes to a UTF-8 string using the resolved encoding.
///
/// Decoding is lossy: invalid sequences become U+FFFD rather than errors, so
/// the pipeline always gets text to work with.
#[must_use]
pub fn decode(content: &[u8], content_type: Option<&str>) -> (String, &'static Encoding) {
    let encoding = resolve_charset(content, content_type);
    let (decoded, _encoding_used, _had_errors) = encoding.decode(content);
    (decoded.into_owned(), encoding)
}
