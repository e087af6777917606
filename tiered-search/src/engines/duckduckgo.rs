//! DuckDuckGo HTML engine: the fast tier.
//!
//! Uses the HTML-only version at `https://html.duckduckgo.com/html/`
//! which requires no JavaScript. Result links are often relative or
//! wrapped in a `/l/?uddg=` redirect, so every href is resolved against
//! the URL the response was actually served from and then unwrapped.

use crate::config::SearchConfig;
use crate::deadline::Deadline;
use crate::engine::{EngineRequest, SearchBackend};
use crate::error::SearchError;
use crate::http;
use crate::types::{EngineTag, SearchItem};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{clean_text, is_web_url, request_error};

/// Markup layout for DuckDuckGo's HTML results page.
///
/// DuckDuckGo changes its markup from time to time; a new layout gets a new
/// `version` and its own fixture under `test-data/`.
#[derive(Debug, Clone)]
pub struct DdgLayout {
    /// Identifier logged with every parse.
    pub version: &'static str,
    result: Selector,
    anchor: Selector,
    anchor_fallback: Selector,
    snippet: Selector,
}

impl DdgLayout {
    /// Layout of the `html.duckduckgo.com` results page since 2023.
    pub fn current() -> Result<Self, SearchError> {
        Ok(Self {
            version: "ddg-html-2023",
            result: selector(".result:not(.result--ad), .web-result:not(.result--ad)")?,
            anchor: selector("a.result__a")?,
            anchor_fallback: selector("a[href]")?,
            snippet: selector(".result__snippet")?,
        })
    }

    /// Extract up to `limit` results from a results page served at `base`.
    ///
    /// Blocks with no anchor or an unusable href are skipped without
    /// failing the rest of the page.
    pub fn extract(&self, html: &str, base: &Url, limit: usize) -> Vec<SearchItem> {
        let document = Html::parse_document(html);
        let mut items = Vec::new();

        for block in document.select(&self.result) {
            if items.len() >= limit {
                break;
            }
            if let Some(item) = self.extract_block(block, base) {
                items.push(item);
            }
        }

        tracing::debug!(
            layout = self.version,
            count = items.len(),
            "DuckDuckGo results parsed"
        );
        items
    }

    fn extract_block(&self, block: ElementRef<'_>, base: &Url) -> Option<SearchItem> {
        let anchor = block
            .select(&self.anchor)
            .next()
            .or_else(|| block.select(&self.anchor_fallback).next())?;

        let href = anchor.value().attr("href").map(str::trim).unwrap_or_default();
        if href.is_empty() {
            return None;
        }

        let url = match resolve_result_url(href, base) {
            Some(url) => url,
            None => {
                tracing::trace!(href, "skipping unusable DuckDuckGo result link");
                return None;
            }
        };

        let title = clean_text(anchor.text());
        let title = if title.is_empty() { url.clone() } else { title };

        let snippet = block
            .select(&self.snippet)
            .next()
            .map(|el| clean_text(el.text()))
            .filter(|s| !s.is_empty());

        Some(SearchItem {
            title,
            url,
            snippet,
            source: EngineTag::DdgHtml,
        })
    }
}

/// Resolve `href` against `base` and unwrap DuckDuckGo's redirect wrapper.
///
/// DDG wraps URLs like: `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`
/// Returns `None` for unparsable or non-web links.
fn resolve_result_url(href: &str, base: &Url) -> Option<String> {
    let resolved = base.join(href).ok()?;

    let target = if is_ddg_redirect(&resolved) {
        let inner = resolved
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())?;
        Url::parse(&inner).ok()?
    } else {
        resolved
    };

    is_web_url(&target).then(|| target.to_string())
}

fn is_ddg_redirect(url: &Url) -> bool {
    let host_matches = url
        .host_str()
        .is_some_and(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"));
    host_matches && url.path().starts_with("/l/")
}

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("invalid selector '{css}': {e:?}")))
}

/// DuckDuckGo's `kl` region-language code for a language hint.
fn region_code(lang: &str) -> String {
    let primary = lang
        .split('-')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match primary.as_str() {
        "" => "wt-wt".to_owned(),
        "en" => "us-en".to_owned(),
        other => format!("{other}-{other}"),
    }
}

/// The fast engine: one GET to DuckDuckGo's HTML endpoint, no scripts.
pub struct DuckDuckGoHtml {
    config: SearchConfig,
    layout: DdgLayout,
}

impl DuckDuckGoHtml {
    /// Create the engine with the current markup layout.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Parse`] if a layout selector fails to compile.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        Ok(Self::with_layout(config, DdgLayout::current()?))
    }

    /// Create the engine with an explicit markup layout.
    pub fn with_layout(config: SearchConfig, layout: DdgLayout) -> Self {
        Self { config, layout }
    }

    fn results_url(&self, query: &str, lang: &str) -> Result<Url, SearchError> {
        let mut url = Url::parse(&self.config.fast_endpoint)
            .map_err(|e| SearchError::Config(format!("invalid fast_endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("kl", &region_code(lang));
        Ok(url)
    }
}

impl SearchBackend for DuckDuckGoHtml {
    async fn search(
        &self,
        request: &EngineRequest<'_>,
        deadline: Deadline,
    ) -> Result<Vec<SearchItem>, SearchError> {
        tracing::trace!(query = request.query, "DuckDuckGo search");

        let url = self.results_url(request.query, request.language)?;
        let user_agent = http::user_agent_for(&self.config);
        let client = http::build_client(&self.config, &user_agent)?;
        let deadline = deadline.earliest(Deadline::after_millis(self.config.http_timeout_ms));

        let (served_from, html) = deadline
            .run("DuckDuckGo request", async {
                let response = client
                    .get(url)
                    .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
                    .header(
                        reqwest::header::ACCEPT_LANGUAGE,
                        http::accept_language(request.language),
                    )
                    .send()
                    .await
                    .map_err(|e| request_error("DuckDuckGo request failed", e))?
                    .error_for_status()
                    .map_err(|e| request_error("DuckDuckGo HTTP error", e))?;

                // Links resolve against where the page was served from,
                // which differs from the request URL after a redirect.
                let served_from = response.url().clone();
                let html = response
                    .text()
                    .await
                    .map_err(|e| request_error("DuckDuckGo response read failed", e))?;
                Ok::<_, SearchError>((served_from, html))
            })
            .await??;

        tracing::trace!(bytes = html.len(), %served_from, "DuckDuckGo response received");

        Ok(self.layout.extract(&html, &served_from, request.limit))
    }

    fn tag(&self) -> EngineTag {
        EngineTag::DdgHtml
    }
}
