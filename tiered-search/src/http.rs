//! Shared HTTP client with User-Agent rotation and language headers.
//!
//! Provides a configured [`reqwest::Client`] with browser-like headers,
//! cookie support, and a User-Agent that stays fixed for the lifetime of
//! one request so that it matches the Accept-Language sent alongside it.

use crate::config::SearchConfig;
use crate::error::SearchError;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Realistic browser User-Agent strings, one picked per request.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Pick the User-Agent for one request: the configured one, or a random
/// entry from the rotation list.
pub fn user_agent_for(config: &SearchConfig) -> String {
    match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    }
}

/// Build a [`reqwest::Client`] for one request.
///
/// The client has:
/// - Cookie store enabled
/// - Timeout ceiling from `http_timeout_ms`
/// - The given User-Agent
/// - Brotli and gzip decompression
/// - Up to 10 redirects; the final URL is available on the response
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig, user_agent: &str) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_millis(config.http_timeout_ms))
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Accept-Language value preferring `lang` with an English fallback.
///
/// `vi` becomes `vi-VI,vi;q=0.9,en;q=0.8`; `en` becomes `en-US,en;q=0.9`.
/// A tag that already carries a region (`pt-BR`) is used as-is for the
/// first entry.
pub fn accept_language(lang: &str) -> String {
    let tagged = locale_tag(lang);
    let primary = tagged
        .split_once('-')
        .map_or(tagged.as_str(), |(primary, _)| primary)
        .to_ascii_lowercase();
    if primary == "en" {
        format!("{tagged},en;q=0.9")
    } else {
        format!("{tagged},{primary};q=0.9,en;q=0.8")
    }
}

/// Full locale tag for a language hint: `en` becomes `en-US`, `vi` becomes
/// `vi-VI`, and a tag with a region (`pt-BR`) is kept.
pub fn locale_tag(lang: &str) -> String {
    let lang = lang.trim();
    if lang.contains('-') {
        return lang.to_owned();
    }
    let primary = lang.to_ascii_lowercase();
    let region = if primary == "en" {
        "US".to_owned()
    } else {
        primary.to_ascii_uppercase()
    };
    format!("{primary}-{region}")
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}
