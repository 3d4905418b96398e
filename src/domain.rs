//! Pay-level (registrable) domain computation.
//!
//! Used by the outlink domain restriction: two hosts belong to the same site
//! when their registrable domains match, e.g. `www.example.com` and
//! `shop.example.com` both reduce to `example.com`.
//!
//! The computation is the classic crawler heuristic rather than a full
//! public-suffix table: take the last two labels, or three when the TLD is a
//! two-letter country code whose penultimate label is a common second-level
//! registration zone (`co.uk`, `com.au`, ...).

/// Labels that act as a second-level registration zone under ccTLDs.
const SECOND_LEVEL_LABELS: &[&str] = &[
    "ac", "co", "com", "edu", "go", "gov", "mil", "ne", "net", "or", "org", "sch",
];

/// Compute the pay-level domain of a host.
///
/// IP literals and single-label hosts have no registrable suffix and are
/// returned whole (lowercased). An empty or structurally invalid host yields
/// `None`, which restriction checks treat as a non-match.
#[must_use]
pub fn pay_level_domain(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<std::net::IpAddr>().is_ok() {
        return Some(host);
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.iter().any(|label| label.is_empty()) {
        return None;
    }
    if labels.len() <= 2 {
        return Some(host);
    }

    let tld = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];
    let keep = if tld.len() == 2 && SECOND_LEVEL_LABELS.contains(&second) {
        3
    } else {
        2
    };
    Some(labels[labels.len() - keep..].join("."))
}
