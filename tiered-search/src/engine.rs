//! Trait definition for the pluggable search engine adapters.
//!
//! The fast HTML scraper and the deep browser-driven engine both implement
//! [`SearchBackend`], which lets the orchestrator be exercised against mock
//! backends with no network access.

use crate::deadline::Deadline;
use crate::error::SearchError;
use crate::types::{EngineTag, SearchItem};

/// Parameters for a single engine invocation.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    /// The search query, already trimmed and known to be non-blank.
    pub query: &'a str,
    /// Maximum number of items to return.
    pub limit: usize,
    /// Language hint, e.g. `en` or `vi`.
    pub language: &'a str,
}

/// A search engine adapter.
///
/// Implementors fetch one results page and turn it into [`SearchItem`]
/// values with absolute URLs. Each adapter handles its own:
///
/// - URL construction with query encoding
/// - Request headers or browser setup
/// - Result extraction
/// - Mapping of failures onto [`SearchError`] variants
///
/// All implementations must be `Send + Sync` so one adapter can serve
/// concurrent requests.
pub trait SearchBackend: Send + Sync {
    /// Run one search, returning at most `request.limit` items.
    ///
    /// The adapter must stop waiting once `deadline` expires.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on network failure, timeout, or when the
    /// engine's runtime cannot be obtained.
    fn search(
        &self,
        request: &EngineRequest<'_>,
        deadline: Deadline,
    ) -> impl std::future::Future<Output = Result<Vec<SearchItem>, SearchError>> + Send;

    /// Returns the tag recorded on items and in diagnostics.
    fn tag(&self) -> EngineTag;
}
