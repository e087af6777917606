//! Search engine adapters.
//!
//! [`DuckDuckGoHtml`] is the fast tier: a single HTTP fetch parsed with CSS
//! selectors. [`BingBrowser`] is the deep tier: a real browser tab on the
//! shared headless session. Both implement [`crate::engine::SearchBackend`].

pub mod bing;
pub mod duckduckgo;

pub use bing::{BingBrowser, BingLayout};
pub use duckduckgo::{DdgLayout, DuckDuckGoHtml};

use url::Url;

use crate::error::SearchError;

/// Join text nodes and collapse runs of whitespace into single spaces.
pub(crate) fn clean_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in parts.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Only `http` and `https` links are usable results.
pub(crate) fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
}

/// Map a reqwest failure onto the network-failure variants.
pub(crate) fn request_error(context: &str, e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::Timeout(format!("{context}: {e}"))
    } else {
        SearchError::Http(format!("{context}: {e}"))
    }
}
