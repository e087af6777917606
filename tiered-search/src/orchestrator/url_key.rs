//! URL keys for deduplication and domain diversity.
//!
//! Two results point at the same page when their origin and path match;
//! query strings and fragments are treated as noise.

use url::Url;

/// Canonical dedup key: origin plus path.
///
/// The origin is serialised the way browsers do it (lowercase host,
/// default port dropped). Unparsable URLs and URLs without a tuple origin
/// (`data:`, `mailto:`) fall back to the raw string.
///
/// # Examples
///
/// ```
/// use tiered_search::orchestrator::url_key::canonical_key;
///
/// let a = canonical_key("https://Example.COM:443/docs?page=2#intro");
/// let b = canonical_key("https://example.com/docs");
/// assert_eq!(a, b);
/// ```
pub fn canonical_key(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_owned();
    };
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return raw.to_owned();
    }
    format!("{}{}", origin.ascii_serialization(), parsed.path())
}

/// Host (with any non-default port) used to count distinct domains.
///
/// Falls back to the raw string when the URL has no host.
pub fn host_key(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_owned();
    };
    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_owned(),
        (None, _) => raw.to_owned(),
    }
}
