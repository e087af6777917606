//! Bing in a headless browser: the deep tier.
//!
//! Bing's results page renders result cards with client-side script, so this
//! engine drives a real tab on the shared [`BrowserSession`]. Heavy
//! resources and websockets are refused at the network layer. The page is
//! read once DOMContentLoaded fires plus a short settle delay, and the
//! cards are pulled out with one in-page script. URL cleanup happens back
//! in Rust.
//!
//! Bing sometimes wraps result links in a `/ck/a?...&u=a1<base64>` click
//! tracker; those are decoded to the real destination.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetLocaleOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    self, EventRequestPaused, FailRequestParams, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{
    self, ErrorReason, ResourceType, SetBlockedUrLsParams,
};
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, NavigateParams};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use url::Url;

use crate::browser::BrowserSession;
use crate::config::SearchConfig;
use crate::deadline::Deadline;
use crate::engine::{EngineRequest, SearchBackend};
use crate::error::SearchError;
use crate::http;
use crate::types::{EngineTag, SearchItem};

use super::{clean_text, is_web_url};

/// Resource types refused through request interception.
const BLOCKED_RESOURCES: [ResourceType; 3] = [
    ResourceType::Image,
    ResourceType::Media,
    ResourceType::Font,
];

/// URL patterns blocked at the network layer. Websocket handshakes never
/// reach request interception, so they are refused here instead.
const BLOCKED_URL_PATTERNS: [&str; 2] = ["ws://*", "wss://*"];

/// Cards read per requested item; the surplus covers cards whose links
/// are dropped during cleanup.
const CARD_OVERSCAN: usize = 2;

/// In-page extraction routine. `__LIMIT__` and `__SELECTORS__` are
/// substituted by [`BingLayout::script`].
const EXTRACT_SCRIPT: &str = r#"((limit, sel) => {
  const text = (el) => (el && el.textContent ? el.textContent.trim() : "");
  const out = [];
  for (const card of document.querySelectorAll(sel.card)) {
    if (out.length >= limit) break;
    const link = card.querySelector(sel.link) || card.querySelector(sel.linkFallback);
    if (!link) continue;
    const snippet = card.querySelector(sel.snippet) || card.querySelector(sel.snippetFallback);
    out.push({
      href: link.getAttribute("href"),
      title: text(link),
      snippet: snippet ? text(snippet) : null,
    });
  }
  return out;
})(__LIMIT__, __SELECTORS__)"#;

/// One result card as returned by the in-page script, before URL cleanup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCard {
    pub href: Option<String>,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

/// Result-card selectors for Bing's results page.
#[derive(Debug, Clone)]
pub struct BingLayout {
    /// Identifier logged with every parse.
    pub version: &'static str,
    pub card: &'static str,
    pub link: &'static str,
    pub link_fallback: &'static str,
    pub snippet: &'static str,
    pub snippet_fallback: &'static str,
}

impl BingLayout {
    /// Bing's organic result markup (`li.b_algo`).
    pub fn current() -> Self {
        Self {
            version: "bing-b_algo-2024",
            card: "li.b_algo",
            link: "h2 a",
            link_fallback: "a[href]",
            snippet: ".b_caption p",
            snippet_fallback: ".b_lineclamp2",
        }
    }

    /// The extraction script for this layout. It reads up to twice
    /// `limit` cards; [`finish`](Self::finish) applies the real cap.
    pub fn script(&self, limit: usize) -> String {
        let selectors = serde_json::json!({
            "card": self.card,
            "link": self.link,
            "linkFallback": self.link_fallback,
            "snippet": self.snippet,
            "snippetFallback": self.snippet_fallback,
        });
        EXTRACT_SCRIPT
            .replace("__LIMIT__", &limit.saturating_mul(CARD_OVERSCAN).to_string())
            .replace("__SELECTORS__", &selectors.to_string())
    }

    /// Turn raw cards into items, resolving links against the page's
    /// final URL. Cards with unusable links are dropped.
    pub fn finish(&self, cards: Vec<RawCard>, base: &Url, limit: usize) -> Vec<SearchItem> {
        let items: Vec<SearchItem> = cards
            .into_iter()
            .filter_map(|card| finish_card(card, base))
            .take(limit)
            .collect();
        tracing::debug!(layout = self.version, count = items.len(), "Bing cards parsed");
        items
    }
}

fn finish_card(card: RawCard, base: &Url) -> Option<SearchItem> {
    let href = card.href.as_deref().map(str::trim).unwrap_or_default();
    if href.is_empty() {
        return None;
    }
    let Some(url) = resolve_card_url(href, base) else {
        tracing::trace!(href, "skipping unusable Bing result link");
        return None;
    };

    let title = card
        .title
        .as_deref()
        .map(|t| clean_text(std::iter::once(t)))
        .unwrap_or_default();
    let title = if title.is_empty() { url.clone() } else { title };
    let snippet = card
        .snippet
        .as_deref()
        .map(|s| clean_text(std::iter::once(s)))
        .filter(|s| !s.is_empty());

    Some(SearchItem {
        title,
        url,
        snippet,
        source: EngineTag::BingBrowser,
    })
}

fn resolve_card_url(href: &str, base: &Url) -> Option<String> {
    let resolved = base.join(href).ok()?;
    let target = if is_bing_click_tracker(&resolved) {
        decode_click_target(&resolved)?
    } else {
        resolved
    };
    is_web_url(&target).then(|| target.to_string())
}

fn is_bing_click_tracker(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|h| h == "bing.com" || h.ends_with(".bing.com"))
        && url.path().starts_with("/ck/a")
}

/// `u=a1<base64url>` carries the real destination.
fn decode_click_target(url: &Url) -> Option<Url> {
    let encoded = url
        .query_pairs()
        .find(|(key, _)| key == "u")
        .map(|(_, value)| value.into_owned())?;
    let payload = encoded.strip_prefix("a1")?.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    Url::parse(&decoded).ok()
}

fn cdp_error(context: &str, e: impl std::fmt::Display) -> SearchError {
    SearchError::Browser(format!("{context}: {e}"))
}

/// The deep engine: Bing rendered in a tab of the shared browser.
pub struct BingBrowser {
    config: SearchConfig,
    session: BrowserSession,
    layout: BingLayout,
}

impl BingBrowser {
    pub fn new(config: SearchConfig, session: BrowserSession) -> Self {
        Self::with_layout(config, session, BingLayout::current())
    }

    pub fn with_layout(config: SearchConfig, session: BrowserSession, layout: BingLayout) -> Self {
        Self {
            config,
            session,
            layout,
        }
    }

    /// The browser session this engine borrows tabs from.
    pub fn session(&self) -> &BrowserSession {
        &self.session
    }

    fn results_url(&self, query: &str, lang: &str) -> Result<Url, SearchError> {
        let mut url = Url::parse(&self.config.deep_endpoint)
            .map_err(|e| SearchError::Config(format!("invalid deep_endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("setlang", lang);
        Ok(url)
    }

    async fn drive(&self, page: &Page, request: &EngineRequest<'_>) -> Result<Vec<SearchItem>, SearchError> {
        let mut ua = SetUserAgentOverrideParams::new(http::user_agent_for(&self.config));
        ua.accept_language = Some(http::accept_language(request.language));
        page.execute(ua)
            .await
            .map_err(|e| cdp_error("user agent override failed", e))?;

        let locale = SetLocaleOverrideParams {
            locale: Some(http::locale_tag(request.language)),
        };
        if let Err(e) = page.execute(locale).await {
            // Chromium rejects locales it has no ICU data for; the
            // Accept-Language header still carries the preference.
            tracing::debug!(error = %e, "locale override rejected");
        }

        let blocker = block_heavy_resources(page).await?;
        let outcome = self.navigate_and_extract(page, request).await;
        blocker.abort();
        outcome
    }

    async fn navigate_and_extract(
        &self,
        page: &Page,
        request: &EngineRequest<'_>,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let url = self.results_url(request.query, request.language)?;

        let mut dom_ready = page
            .event_listener::<EventDomContentEventFired>()
            .await
            .map_err(|e| cdp_error("DOMContentLoaded listener failed", e))?;
        let navigated = page
            .execute(NavigateParams::new(url.as_str()))
            .await
            .map_err(|e| cdp_error("navigation failed", e))?;
        if let Some(ref failure) = navigated.result.error_text {
            return Err(SearchError::Http(format!("Bing navigation failed: {failure}")));
        }
        if dom_ready.next().await.is_none() {
            return Err(SearchError::Browser(
                "tab closed before DOMContentLoaded".into(),
            ));
        }
        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        let script = EvaluateParams::builder()
            .expression(self.layout.script(request.limit))
            .return_by_value(true)
            .build()
            .map_err(|e| cdp_error("extraction script rejected", e))?;
        let cards: Vec<RawCard> = page
            .evaluate_expression(script)
            .await
            .map_err(|e| cdp_error("extraction script failed", e))?
            .into_value()
            .map_err(|e| SearchError::Parse(format!("unexpected Bing card data: {e}")))?;

        let served_from = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or(url);

        Ok(self.layout.finish(cards, &served_from, request.limit))
    }
}

fn blocked_urls() -> SetBlockedUrLsParams {
    SetBlockedUrLsParams::new(
        BLOCKED_URL_PATTERNS
            .iter()
            .map(|pattern| (*pattern).to_owned())
            .collect::<Vec<_>>(),
    )
}

/// Refuse websocket connections outright, and fail image, media and font
/// requests as soon as they are issued. The returned task answers paused
/// requests until aborted.
async fn block_heavy_resources(page: &Page) -> Result<JoinHandle<()>, SearchError> {
    page.execute(network::EnableParams::default())
        .await
        .map_err(|e| cdp_error("network domain enable failed", e))?;
    page.execute(blocked_urls())
        .await
        .map_err(|e| cdp_error("websocket blocking failed", e))?;

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| cdp_error("request interception listener failed", e))?;

    let patterns = BLOCKED_RESOURCES
        .iter()
        .map(|kind| RequestPattern {
            url_pattern: None,
            resource_type: Some(kind.clone()),
            request_stage: Some(RequestStage::Request),
        })
        .collect();
    page.execute(fetch::EnableParams {
        patterns: Some(patterns),
        handle_auth_requests: None,
    })
    .await
    .map_err(|e| cdp_error("request interception failed", e))?;

    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let refuse = FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
            if let Err(e) = page.execute(refuse).await {
                tracing::trace!(error = %e, "could not refuse blocked request");
            }
        }
    }))
}

impl SearchBackend for BingBrowser {
    async fn search(
        &self,
        request: &EngineRequest<'_>,
        deadline: Deadline,
    ) -> Result<Vec<SearchItem>, SearchError> {
        tracing::trace!(query = request.query, "Bing browser search");

        // Launching is not bound to this request's deadline: a launch that
        // outlives one request still serves the next.
        let lease = self.session.open_page().await?;
        let deadline = deadline.earliest(Deadline::after_millis(self.config.http_timeout_ms));

        let outcome = match lease.page() {
            Some(page) => deadline
                .run("Bing browser search", self.drive(page, request))
                .await
                .and_then(|result| result),
            None => Err(SearchError::Browser("leased tab already closed".into())),
        };
        lease.release().await;
        outcome
    }

    fn tag(&self) -> EngineTag {
        EngineTag::BingBrowser
    }
}
