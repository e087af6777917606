//! Web search tool backed by the two-tier search orchestrator.
//!
//! The tool owns one [`WebSearch`] for the life of the host, so the deep
//! tier's headless browser is launched at most once and shared by every
//! call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tiered_search::engines::{BingBrowser, DuckDuckGoHtml};
use tiered_search::{SearchError, SearchMode, TwoTierSearch};

use crate::error::ToolError;

use super::types::{DEFAULT_MAX_BYTES, Tool, ToolResult, to_pretty_json};

/// The production orchestrator: DuckDuckGo HTML first, Bing in Chromium
/// when escalating.
pub type WebSearch = TwoTierSearch<DuckDuckGoHtml, BingBrowser>;

/// Tool that runs a tiered web search and returns the full report as JSON.
///
/// # Arguments (JSON)
///
/// - `q` (string, required): the search query; a blank query returns an
///   empty report
/// - `limit` (integer, optional): number of results, `1..=max_results`
/// - `lang` (string, optional): language hint such as `en` or `vi`
/// - `mode` (string, optional): `fast`, `deep` or `auto` (default)
pub struct WebSearchTool {
    search: Arc<WebSearch>,
    max_bytes: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArgs {
    q: String,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    lang: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

/// Validated arguments for one call.
struct SearchCall {
    query: String,
    limit: Option<usize>,
    lang: Option<String>,
    mode: SearchMode,
}

impl WebSearchTool {
    /// Create a tool around a shared orchestrator.
    pub fn new(search: Arc<WebSearch>) -> Self {
        Self {
            search,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    /// Override the output byte limit.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn parse_args(&self, args: serde_json::Value) -> Result<SearchCall, ToolError> {
        let args: SearchArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::Validation(format!("invalid search_web arguments: {e}")))?;

        let max = self.search.config().max_results;
        let limit = match args.limit {
            Some(n) if n == 0 || n > max as u64 => {
                return Err(ToolError::Validation(format!(
                    "limit must be between 1 and {max}, got {n}"
                )));
            }
            Some(n) => Some(n as usize),
            None => None,
        };

        let mode = match args.mode.as_deref() {
            Some(raw) => raw.parse::<SearchMode>()?,
            None => SearchMode::Auto,
        };

        Ok(SearchCall {
            query: args.q,
            limit,
            lang: args.lang,
            mode,
        })
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web. Tries a fast HTML engine first and escalates to a headless browser \
         when results look weak or the query is time-sensitive. Returns the ranked items \
         with the engines used and per-engine diagnostics."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "q": {
                    "type": "string",
                    "description": "The search query"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": self.search.config().max_results,
                    "description": format!(
                        "Maximum number of results (default {})",
                        self.search.config().default_results
                    )
                },
                "lang": {
                    "type": "string",
                    "description": "Language hint, e.g. \"en\" or \"vi\""
                },
                "mode": {
                    "type": "string",
                    "enum": ["fast", "deep", "auto"],
                    "description": "fast: HTML engine only; deep: browser engine only; auto: escalate when needed"
                }
            },
            "required": ["q"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ToolError> {
        let call = self.parse_args(args)?;

        let report = match self
            .search
            .perform_search(&call.query, call.mode, call.limit, call.lang.as_deref())
            .await
        {
            Ok(report) => report,
            Err(e @ (SearchError::InvalidInput(_) | SearchError::Config(_))) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(mode = %call.mode, error = %e, "web search failed");
                return Ok(ToolResult::failure(format!("web search failed: {e}")));
            }
        };

        let json = to_pretty_json(&report)?;
        Ok(ToolResult::bounded(&json, self.max_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tiered_search::{BrowserSession, BrowserSettings, SearchConfig};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"<html><body>
<div class="result web-result">
  <a class="result__a" href="https://www.rust-lang.org/">Rust Programming Language</a>
  <a class="result__snippet">A language empowering everyone.</a>
</div>
<div class="result web-result">
  <a class="result__a" href="https://doc.rust-lang.org/book/">The Rust Book</a>
</div>
<div class="result web-result">
  <a class="result__a" href="https://crates.io/">crates.io: Rust Package Registry</a>
</div>
</body></html>"#;

    fn unlaunchable_browser() -> BrowserSettings {
        BrowserSettings {
            executable: Some("/nonexistent/chromium-for-tests".into()),
            ..Default::default()
        }
    }

    fn tool_for(config: SearchConfig) -> WebSearchTool {
        let session = BrowserSession::new(config.browser.clone(), Duration::from_secs(2));
        let search = WebSearch::with_session(config, session).expect("valid config");
        WebSearchTool::new(Arc::new(search))
    }

    fn offline_tool() -> WebSearchTool {
        tool_for(SearchConfig {
            fast_endpoint: "http://127.0.0.1:1/html/".into(),
            http_timeout_ms: 1_000,
            fast_time_budget_ms: 500,
            browser: unlaunchable_browser(),
            ..Default::default()
        })
    }

    fn tool_against(server: &MockServer) -> WebSearchTool {
        tool_for(SearchConfig {
            fast_endpoint: format!("{}/html/", server.uri()),
            user_agent: Some("TestBot/1.0".into()),
            http_timeout_ms: 5_000,
            fast_time_budget_ms: 2_000,
            browser: unlaunchable_browser(),
            ..Default::default()
        })
    }

    #[test]
    fn schema_requires_q_and_bounds_limit() {
        let tool = offline_tool();
        let schema = tool.schema();
        assert_eq!(schema["required"], serde_json::json!(["q"]));
        assert_eq!(schema["properties"]["limit"]["minimum"], 1);
        assert_eq!(schema["properties"]["limit"]["maximum"], 50);
        assert_eq!(
            schema["properties"]["mode"]["enum"],
            serde_json::json!(["fast", "deep", "auto"])
        );
        assert_eq!(tool.name(), "search_web");
    }

    #[tokio::test]
    async fn missing_query_is_validation_error() {
        let err = offline_tool()
            .execute(serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)), "got {err}");
        assert!(err.to_string().contains("q"));
    }

    #[tokio::test]
    async fn blank_query_is_empty_report_without_engines() {
        let result = offline_tool()
            .execute(serde_json::json!({"q": "   ", "mode": "deep"}))
            .await
            .expect("blank query is not an argument error");
        assert!(result.success, "{:?}", result.error);

        let report: serde_json::Value = serde_json::from_str(&result.content).expect("json");
        assert_eq!(report["items"], serde_json::json!([]));
        assert_eq!(report["enginesUsed"], serde_json::json!([]));
        assert_eq!(report["escalated"], false);
    }

    #[tokio::test]
    async fn out_of_range_limit_is_rejected() {
        let tool = offline_tool();
        for limit in [0, 51] {
            let err = tool
                .execute(serde_json::json!({"q": "rust", "limit": limit}))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("limit must be between 1 and 50"), "{err}");
        }
    }

    #[tokio::test]
    async fn unknown_mode_and_fields_are_rejected() {
        let tool = offline_tool();
        let err = tool
            .execute(serde_json::json!({"q": "rust", "mode": "turbo"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(ref m) if m.contains("turbo")));

        let err = tool
            .execute(serde_json::json!({"q": "rust", "query": "rust"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn fast_mode_returns_report_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;
        let tool = tool_against(&server);

        let result = tool
            .execute(serde_json::json!({"q": "rust", "limit": 2, "mode": "fast"}))
            .await
            .expect("search");
        assert!(result.success);
        assert!(!result.truncated);

        let report: serde_json::Value = serde_json::from_str(&result.content).expect("json");
        assert_eq!(report["modeUsed"], "fast");
        assert_eq!(report["escalated"], false);
        let items = report["items"].as_array().expect("items");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["url"], "https://www.rust-lang.org/");
        assert_eq!(items[0]["source"], "ddg_html");
        // Pretty-printed for readability.
        assert!(result.content.contains("\n  \"items\""));
    }

    #[tokio::test]
    async fn deep_mode_without_browser_is_failed_result() {
        let result = offline_tool()
            .execute(serde_json::json!({"q": "rust", "mode": "deep"}))
            .await
            .expect("engine failures are reported in the result");
        assert!(!result.success);
        let error = result.error.expect("error message");
        assert!(error.starts_with("web search failed: engine unavailable"), "{error}");
    }

    #[tokio::test]
    async fn output_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;
        let tool = tool_against(&server).with_max_bytes(64);

        let result = tool
            .execute(serde_json::json!({"q": "rust", "mode": "fast"}))
            .await
            .expect("search");
        assert!(result.success);
        assert!(result.truncated);
        assert!(result.content.ends_with("[output truncated at 64 bytes]"));
    }
}
