//! # tiered-search
//!
//! Two-tier web search with escalation from a fast HTML scraper to a
//! headless browser.
//!
//! The fast tier fetches DuckDuckGo's script-free results page under a
//! short time budget. When its results look weak (too few, degenerate
//! titles, one site dominating, or a time-sensitive query), the deep tier
//! renders Bing in a shared headless Chromium and the two result lists are
//! merged and deduplicated by origin and path.
//!
//! The crate also carries the retrieval helpers that sit next to search:
//! readable-text extraction from a page ([`fetch_page_content`]) and
//! encyclopedia summaries ([`wiki_summary`]).
//!
//! ## Design
//!
//! - Engines implement [`SearchBackend`]; the orchestrator is generic over
//!   both tiers and can be driven by mock backends
//! - Every suspending call runs under an explicit [`Deadline`]
//! - The browser is an injected, reference-counted [`BrowserSession`],
//!   launched lazily and at most once
//! - Requests are stateless: nothing is cached or persisted
//!
//! ## Privacy
//!
//! - Search queries are logged only at trace level
//! - No API keys; no network listeners

pub mod browser;
pub mod config;
pub mod content;
pub mod deadline;
pub mod engine;
pub mod engines;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod types;
pub mod wiki;

pub use browser::BrowserSession;
pub use config::{BrowserSettings, SearchConfig};
pub use content::fetch_page_content;
pub use deadline::Deadline;
pub use engine::{EngineRequest, SearchBackend};
pub use error::{Result, SearchError};
pub use orchestrator::TwoTierSearch;
pub use types::{
    Diagnostics, EngineMetrics, EngineTag, MergePriority, PageContent, SearchItem, SearchMode,
    SearchReport,
};
pub use wiki::{wiki_summary, WikiSummary};

/// Search with the default engines, building them from `config`.
///
/// The deep tier borrows tabs from `browser`, so every caller that passes
/// the same session shares one Chromium process. The session is left
/// running; shut it down once the process is done searching.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid configuration, and in
/// [`SearchMode::Deep`] any deep engine failure.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> tiered_search::Result<()> {
/// use std::time::Duration;
/// use tiered_search::{BrowserSession, SearchConfig, SearchMode};
///
/// let config = SearchConfig::default();
/// let browser = BrowserSession::new(config.browser.clone(), Duration::from_secs(10));
/// let report =
///     tiered_search::search("rust programming", SearchMode::Auto, Some(5), &config, &browser)
///         .await?;
/// for item in &report.items {
///     println!("{}: {}", item.title, item.url);
/// }
/// browser.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub async fn search(
    query: &str,
    mode: SearchMode,
    limit: Option<usize>,
    config: &SearchConfig,
    browser: &BrowserSession,
) -> Result<SearchReport> {
    let search = TwoTierSearch::with_session(config.clone(), browser.clone())?;
    search.perform_search(query, mode, limit, None).await
}
