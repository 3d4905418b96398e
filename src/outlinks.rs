//! Candidate outlink collection.
//!
//! Walks every anchor carrying an href, resolves it against the document's
//! base URL and returns the unique set of absolute http(s) targets. A single
//! unresolvable href is dropped and logged; it never fails the document.

use std::collections::BTreeSet;

use dom_query::{Document, Selection};
use log::debug;
use url::Url;

/// Collect the unique absolute candidate target URLs of a document.
///
/// Blank hrefs are ignored. Hrefs that do not resolve to an http(s) URL with
/// a host (fragments-only anchors, `javascript:`, `mailto:` and friends) are
/// dropped per link.
#[must_use]
pub fn extract_outlinks(doc: &Document, base: &Url) -> BTreeSet<String> {
    let mut links = BTreeSet::new();

    for node in doc.select("a[href]").nodes() {
        let anchor = Selection::from(*node);
        let Some(href) = anchor.attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }
        match resolve_href(href, base) {
            Some(target) => {
                links.insert(target);
            }
            None => debug!("dropping unresolvable href '{href}' on {base}"),
        }
    }

    links
}

/// Resolve one href against the base URL to an absolute crawlable target.
fn resolve_href(href: &str, base: &Url) -> Option<String> {
    let resolved = base.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.host_str()?;
    Some(resolved.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://a.com/dir/page.html").expect("valid base URL")
    }

    #[test]
    fn resolves_relative_hrefs() {
        let doc = Document::from(r#"<html><body><a href="/p">x</a><a href="sub.html">y</a></body></html>"#);
        let links = extract_outlinks(&doc, &base());

        assert!(links.contains("http://a.com/p"));
        assert!(links.contains("http://a.com/dir/sub.html"));
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn identical_targets_deduplicate() {
        let doc = Document::from(r#"<html><body><a href="/p">x</a><a href="/p">y</a></body></html>"#);
        let links = extract_outlinks(&doc, &base());

        assert_eq!(links.len(), 1);
        assert!(links.contains("http://a.com/p"));
    }

    #[test]
    fn blank_hrefs_are_ignored() {
        let doc = Document::from(r#"<html><body><a href="   ">x</a><a href="">y</a></body></html>"#);
        assert!(extract_outlinks(&doc, &base()).is_empty());
    }

    #[test]
    fn non_http_schemes_are_dropped() {
        let doc = Document::from(
            r#"<html><body>
                <a href="javascript:void(0)">j</a>
                <a href="mailto:a@b.com">m</a>
                <a href="ftp://files.example.com/f">f</a>
                <a href="https://b.com/ok">ok</a>
            </body></html>"#,
        );
        let links = extract_outlinks(&doc, &base());

        assert_eq!(links.len(), 1);
        assert!(links.contains("https://b.com/ok"));
    }

    #[test]
    fn bad_link_does_not_abort_the_rest() {
        let doc = Document::from(
            r#"<html><body><a href="http://[broken">bad</a><a href="/good">ok</a></body></html>"#,
        );
        let links = extract_outlinks(&doc, &base());

        assert_eq!(links.len(), 1);
        assert!(links.contains("http://a.com/good"));
    }

    #[test]
    fn anchors_without_href_are_skipped() {
        let doc = Document::from(r#"<html><body><a name="top">x</a></body></html>"#);
        assert!(extract_outlinks(&doc, &base()).is_empty());
    }
}
