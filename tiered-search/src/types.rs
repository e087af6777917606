//! Core types for search results, engine identification and reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// A single search result returned from one of the engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    /// The title of the result. Falls back to the URL when the anchor is empty.
    pub title: String,
    /// Absolute URL of the result.
    pub url: String,
    /// A text snippet summarising the page, when the engine provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Which engine returned this result.
    pub source: EngineTag,
}

/// Identifies the engine that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineTag {
    /// DuckDuckGo's HTML-only endpoint, scraped without script execution.
    DdgHtml,
    /// Bing rendered in a headless browser.
    BingBrowser,
}

impl EngineTag {
    /// Stable tag string used in reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DdgHtml => "ddg_html",
            Self::BingBrowser => "bing_browser",
        }
    }
}

impl fmt::Display for EngineTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the orchestrator should use the two engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Fast engine only.
    Fast,
    /// Deep engine only.
    Deep,
    /// Fast engine first, escalating to the deep engine when results are weak.
    #[default]
    Auto,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Deep => "deep",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "deep" => Ok(Self::Deep),
            "auto" => Ok(Self::Auto),
            other => Err(SearchError::InvalidInput(format!(
                "unknown search mode '{other}' (expected fast, deep or auto)"
            ))),
        }
    }
}

/// Which engine's results win when both return the same page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePriority {
    /// Fast results first, deep results fill the remaining slots.
    #[default]
    FastFirst,
    /// Deep results first, fast results fill the remaining slots.
    DeepFirst,
}

impl FromStr for MergePriority {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast_first" | "fast" => Ok(Self::FastFirst),
            "deep_first" | "deep" => Ok(Self::DeepFirst),
            other => Err(SearchError::Config(format!(
                "unknown merge priority '{other}' (expected fast_first or deep_first)"
            ))),
        }
    }
}

/// Metrics recorded for a single engine invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMetrics {
    /// Wall-clock time spent in the adapter.
    pub elapsed_ms: u64,
    /// Number of items the adapter returned (0 on failure).
    pub item_count: usize,
    /// Failure message, if the adapter failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Observability data attached to every [`SearchReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Per-engine metrics, keyed by engine tag.
    pub engines: BTreeMap<EngineTag, EngineMetrics>,
    /// The policy rule that triggered escalation, in auto mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
    /// Set when escalation failed and the report fell back to fast results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
    /// Fast-path time budget in effect for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<u64>,
    /// Merge order used when results from both engines were combined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_priority: Option<MergePriority>,
}

/// The outcome of a single search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    /// Deduplicated results, never longer than the requested limit.
    pub items: Vec<SearchItem>,
    /// The mode the caller requested.
    pub mode_used: SearchMode,
    /// Engines actually invoked, in invocation order.
    pub engines_used: Vec<EngineTag>,
    /// Whether the deep engine was brought in by the escalation policy.
    pub escalated: bool,
    pub diagnostics: Diagnostics,
}

impl SearchReport {
    /// An empty report for a request that invoked no engine.
    pub fn empty(mode: SearchMode) -> Self {
        Self {
            items: Vec::new(),
            mode_used: mode,
            engines_used: Vec::new(),
            escalated: false,
            diagnostics: Diagnostics::default(),
        }
    }
}

/// Extracted readable content from a fetched web page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    /// The URL that was fetched.
    pub url: String,
    /// The page title extracted from HTML.
    pub title: String,
    /// Author, from `<meta name="author">`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    /// Site name, from `<meta property="og:site_name">`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Document language, from `<html lang>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Cleaned, readable text content with HTML boilerplate stripped.
    pub text: String,
    /// Number of words in the extracted text.
    pub word_count: usize,
    /// Page count, for PDF documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_tag_display() {
        assert_eq!(EngineTag::DdgHtml.to_string(), "ddg_html");
        assert_eq!(EngineTag::BingBrowser.to_string(), "bing_browser");
    }

    #[test]
    fn engine_tag_serializes_as_snake_case() {
        let json = serde_json::to_string(&EngineTag::BingBrowser).expect("serialize");
        assert_eq!(json, "\"bing_browser\"");
    }

    #[test]
    fn search_mode_parses_case_insensitively() {
        assert_eq!("FAST".parse::<SearchMode>().ok(), Some(SearchMode::Fast));
        assert_eq!(" deep ".parse::<SearchMode>().ok(), Some(SearchMode::Deep));
        assert_eq!("auto".parse::<SearchMode>().ok(), Some(SearchMode::Auto));
    }

    #[test]
    fn search_mode_rejects_unknown() {
        let err = "thorough".parse::<SearchMode>().unwrap_err();
        assert!(err.to_string().contains("thorough"));
    }

    #[test]
    fn default_mode_is_auto() {
        assert_eq!(SearchMode::default(), SearchMode::Auto);
    }

    #[test]
    fn merge_priority_parses_short_forms() {
        assert_eq!(
            "deep".parse::<MergePriority>().ok(),
            Some(MergePriority::DeepFirst)
        );
        assert_eq!(
            "fast_first".parse::<MergePriority>().ok(),
            Some(MergePriority::FastFirst)
        );
        assert!("random".parse::<MergePriority>().is_err());
    }

    #[test]
    fn snippet_omitted_when_absent() {
        let item = SearchItem {
            title: "Example".into(),
            url: "https://example.com/".into(),
            snippet: None,
            source: EngineTag::DdgHtml,
        };
        let json = serde_json::to_string(&item).expect("serialize");
        assert!(!json.contains("snippet"));
        assert!(json.contains("\"source\":\"ddg_html\""));
    }

    #[test]
    fn report_uses_camel_case_keys() {
        let mut report = SearchReport::empty(SearchMode::Auto);
        report.engines_used.push(EngineTag::DdgHtml);
        report.diagnostics.engines.insert(
            EngineTag::DdgHtml,
            EngineMetrics {
                elapsed_ms: 12,
                item_count: 0,
                error: None,
            },
        );
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["modeUsed"], "auto");
        assert_eq!(value["enginesUsed"][0], "ddg_html");
        assert_eq!(value["diagnostics"]["engines"]["ddg_html"]["elapsedMs"], 12);
        assert!(value["diagnostics"].get("degraded").is_none());
    }

    #[test]
    fn page_content_serializes_optional_metadata() {
        let page = PageContent {
            url: "https://example.com".into(),
            title: "Example".into(),
            byline: Some("Jane Doe".into()),
            site_name: None,
            lang: Some("en".into()),
            text: "Hello world".into(),
            word_count: 2,
            page_count: None,
        };
        let value = serde_json::to_value(&page).expect("serialize");
        assert_eq!(value["byline"], "Jane Doe");
        assert_eq!(value["wordCount"], 2);
        assert!(value.get("siteName").is_none());
        assert!(value.get("pageCount").is_none());

        let pdf = PageContent {
            page_count: Some(12),
            ..page
        };
        let value = serde_json::to_value(&pdf).expect("serialize");
        assert_eq!(value["pageCount"], 12);
    }
}
