//! Two-tier search: fast engine first, deep engine when it is worth it.
//!
//! Mode decides the path:
//!
//! - `fast`: the fast engine alone. Its failures become an empty result set.
//! - `deep`: the deep engine alone. Its failures reach the caller.
//! - `auto`: the fast engine, then the [`EscalationPolicy`]. If the policy
//!   fires, the deep engine runs and both lists are merged. A failing deep
//!   engine degrades the report to the fast results instead of erroring.
//!
//! Every path records which engines ran, in order, with timings and counts.

use std::time::Duration;

use tokio::time::Instant;

use crate::browser::BrowserSession;
use crate::config::SearchConfig;
use crate::deadline::Deadline;
use crate::engine::{EngineRequest, SearchBackend};
use crate::engines::{BingBrowser, DuckDuckGoHtml};
use crate::error::SearchError;
use crate::types::{Diagnostics, EngineMetrics, EngineTag, SearchItem, SearchMode, SearchReport};

use super::escalation::EscalationPolicy;
use super::merge::merge_tiers;

/// Orchestrates a fast and a deep [`SearchBackend`].
///
/// The orchestrator itself holds no per-request state; one instance can
/// serve any number of concurrent [`perform_search`](Self::perform_search)
/// calls.
pub struct TwoTierSearch<F, D> {
    fast: F,
    deep: D,
    config: SearchConfig,
    policy: Option<EscalationPolicy>,
}

impl TwoTierSearch<DuckDuckGoHtml, BingBrowser> {
    /// DuckDuckGo HTML as the fast tier and Bing in a fresh shared browser
    /// session as the deep tier.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` fails validation.
    pub fn from_config(config: SearchConfig) -> Result<Self, SearchError> {
        let session = BrowserSession::new(
            config.browser.clone(),
            Duration::from_millis(config.http_timeout_ms),
        );
        Self::with_session(config, session)
    }

    /// Like [`from_config`](Self::from_config) but borrowing tabs from an
    /// existing browser session.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` fails validation.
    pub fn with_session(config: SearchConfig, session: BrowserSession) -> Result<Self, SearchError> {
        config.validate()?;
        let fast = DuckDuckGoHtml::new(config.clone())?;
        let deep = BingBrowser::new(config.clone(), session);
        Ok(Self::new(fast, deep, config))
    }

    /// The shared browser behind the deep tier.
    pub fn browser(&self) -> &BrowserSession {
        self.deep.session()
    }
}

impl<F, D> TwoTierSearch<F, D>
where
    F: SearchBackend,
    D: SearchBackend,
{
    pub fn new(fast: F, deep: D, config: SearchConfig) -> Self {
        Self {
            fast,
            deep,
            config,
            policy: None,
        }
    }

    /// Pin the escalation policy instead of building one from today's date
    /// on every request.
    pub fn with_policy(mut self, policy: EscalationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run one search.
    ///
    /// `limit` is clamped into `[1, max_results]` (`None` means
    /// `default_results`). `language` falls back to the configured default.
    /// A blank query returns an empty report without invoking any engine.
    ///
    /// # Errors
    ///
    /// Only [`SearchMode::Deep`] returns errors: the deep engine's failure,
    /// including [`SearchError::EngineUnavailable`], is passed through.
    pub async fn perform_search(
        &self,
        query: &str,
        mode: SearchMode,
        limit: Option<usize>,
        language: Option<&str>,
    ) -> Result<SearchReport, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!(%mode, "blank query, no engine invoked");
            return Ok(SearchReport::empty(mode));
        }

        let request = EngineRequest {
            query,
            limit: self.config.effective_limit(limit),
            language: self.config.effective_language(language),
        };
        tracing::trace!(query, %mode, limit = request.limit, "search requested");

        let mut trace = Trace::default();
        let report = match mode {
            SearchMode::Fast => {
                let items = self.run_fast(&request, &mut trace).await;
                trace.into_report(mode, items, false, request.limit)
            }
            SearchMode::Deep => {
                let items = self.run_deep(&request, &mut trace).await?;
                trace.into_report(mode, items, false, request.limit)
            }
            SearchMode::Auto => self.run_auto(&request, trace).await,
        };

        tracing::debug!(
            %mode,
            count = report.items.len(),
            escalated = report.escalated,
            engines = ?report.engines_used,
            "search completed"
        );
        Ok(report)
    }

    async fn run_auto(&self, request: &EngineRequest<'_>, mut trace: Trace) -> SearchReport {
        let fast_items = self.run_fast(request, &mut trace).await;

        let policy = self.policy.unwrap_or_else(EscalationPolicy::for_today);
        let Some(reason) = policy.evaluate(request.query, &fast_items, request.limit) else {
            return trace.into_report(SearchMode::Auto, fast_items, false, request.limit);
        };
        tracing::debug!(%reason, "escalating to deep engine");
        trace.diagnostics.escalation_reason = Some(reason.to_string());

        match self.run_deep(request, &mut trace).await {
            Ok(deep_items) => {
                let priority = self.config.merge_priority;
                trace.diagnostics.merge_priority = Some(priority);
                let merged = merge_tiers(fast_items, deep_items, priority, request.limit);
                trace.into_report(SearchMode::Auto, merged, true, request.limit)
            }
            Err(e) => {
                tracing::warn!(error = %e, "deep engine failed, returning fast results");
                trace.diagnostics.degraded =
                    Some(format!("deep engine failed ({}): {e}", e.kind()));
                trace.into_report(SearchMode::Auto, fast_items, true, request.limit)
            }
        }
    }

    /// The fast tier never fails the request: an error is recorded and
    /// treated as no results.
    async fn run_fast(&self, request: &EngineRequest<'_>, trace: &mut Trace) -> Vec<SearchItem> {
        let budget = self.config.fast_time_budget_ms;
        trace.diagnostics.time_budget_ms = Some(budget);
        let deadline = Deadline::after_millis(budget);

        match invoke(&self.fast, request, deadline, trace).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(engine = %self.fast.tag(), error = %e, "fast engine failed");
                Vec::new()
            }
        }
    }

    async fn run_deep(
        &self,
        request: &EngineRequest<'_>,
        trace: &mut Trace,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let deadline = Deadline::after_millis(self.config.http_timeout_ms);
        invoke(&self.deep, request, deadline, trace).await
    }
}

/// Run one engine and record it, success or failure.
async fn invoke<E: SearchBackend>(
    engine: &E,
    request: &EngineRequest<'_>,
    deadline: Deadline,
    trace: &mut Trace,
) -> Result<Vec<SearchItem>, SearchError> {
    let tag = engine.tag();
    let started = Instant::now();
    let outcome = engine.search(request, deadline).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let metrics = match outcome {
        Ok(ref items) => {
            tracing::debug!(engine = %tag, count = items.len(), elapsed_ms, "engine returned results");
            EngineMetrics {
                elapsed_ms,
                item_count: items.len(),
                error: None,
            }
        }
        Err(ref e) => EngineMetrics {
            elapsed_ms,
            item_count: 0,
            error: Some(e.to_string()),
        },
    };
    trace.engines_used.push(tag);
    trace.diagnostics.engines.insert(tag, metrics);
    outcome
}

/// What one request did, accumulated as engines run.
#[derive(Debug, Default)]
struct Trace {
    engines_used: Vec<EngineTag>,
    diagnostics: Diagnostics,
}

impl Trace {
    fn into_report(
        self,
        mode: SearchMode,
        mut items: Vec<SearchItem>,
        escalated: bool,
        limit: usize,
    ) -> SearchReport {
        items.truncate(limit);
        SearchReport {
            items,
            mode_used: mode,
            engines_used: self.engines_used,
            escalated,
            diagnostics: self.diagnostics,
        }
    }
}
