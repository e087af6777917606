//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls endpoints, time budgets, result counts, merge
//! order and browser launch options. Values can come from a TOML table
//! (`#[serde(default)]` on every field) or from environment variables via
//! [`SearchConfig::from_env`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::MergePriority;

/// DuckDuckGo's JavaScript-free results endpoint.
pub const DEFAULT_FAST_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Bing's results page, rendered by the headless browser.
pub const DEFAULT_DEEP_ENDPOINT: &str = "https://www.bing.com/search";

/// Wikipedia site root; `{lang}` is replaced with the requested edition.
pub const DEFAULT_WIKI_ENDPOINT: &str = "https://{lang}.wikipedia.org";

/// Configuration for the tiered search engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Custom User-Agent string. If `None`, one realistic browser
    /// User-Agent is picked per request from a built-in rotation list.
    pub user_agent: Option<String>,
    /// Language used when a request does not specify one.
    pub default_language: String,
    /// Ceiling for any single network operation, in milliseconds.
    pub http_timeout_ms: u64,
    /// Wall-clock allowance for the fast engine, in milliseconds.
    pub fast_time_budget_ms: u64,
    /// Result count used when a request does not specify one.
    pub default_results: usize,
    /// Upper bound for a requested result count.
    pub max_results: usize,
    /// Merge order when both engines contribute results.
    pub merge_priority: MergePriority,
    /// Delay after the deep engine's page reaches DOMContentLoaded, giving
    /// client-side rendering time to populate result cards.
    pub settle_delay_ms: u64,
    /// Fast engine endpoint.
    pub fast_endpoint: String,
    /// Deep engine endpoint.
    pub deep_endpoint: String,
    /// Encyclopedia site root, with an optional `{lang}` placeholder.
    pub wiki_endpoint: String,
    /// Headless browser launch options.
    pub browser: BrowserSettings,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            default_language: "en".into(),
            http_timeout_ms: 15_000,
            fast_time_budget_ms: 1_800,
            default_results: 5,
            max_results: 50,
            merge_priority: MergePriority::FastFirst,
            settle_delay_ms: 200,
            fast_endpoint: DEFAULT_FAST_ENDPOINT.into(),
            deep_endpoint: DEFAULT_DEEP_ENDPOINT.into(),
            wiki_endpoint: DEFAULT_WIKI_ENDPOINT.into(),
            browser: BrowserSettings::default(),
        }
    }
}

/// Launch options for the shared headless browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Explicit Chrome/Chromium executable. Auto-detected when `None`.
    pub executable: Option<PathBuf>,
    /// Run without a visible window.
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            viewport_width: 1366,
            viewport_height: 768,
        }
    }
}

impl SearchConfig {
    /// Build a configuration from defaults plus process environment overrides.
    ///
    /// Recognised variables: `USER_AGENT`, `LANG_DEFAULT`, `HTTP_TIMEOUT`,
    /// `FAST_TIME_BUDGET_MS`, `DEFAULT_RESULTS`, `MAX_RESULTS`,
    /// `MERGE_PRIORITY`, `CHROME_PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, SearchError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    ///
    /// Blank values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if a value is present but unparsable.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(ua) = get("USER_AGENT") {
            self.user_agent = Some(ua);
        }
        if let Some(lang) = get("LANG_DEFAULT") {
            self.default_language = lang.trim().to_owned();
        }
        if let Some(v) = get("HTTP_TIMEOUT") {
            self.http_timeout_ms = parse_number("HTTP_TIMEOUT", &v)?;
        }
        if let Some(v) = get("FAST_TIME_BUDGET_MS") {
            self.fast_time_budget_ms = parse_number("FAST_TIME_BUDGET_MS", &v)?;
        }
        if let Some(v) = get("DEFAULT_RESULTS") {
            self.default_results = parse_number("DEFAULT_RESULTS", &v)?;
        }
        if let Some(v) = get("MAX_RESULTS") {
            self.max_results = parse_number("MAX_RESULTS", &v)?;
        }
        if let Some(v) = get("MERGE_PRIORITY") {
            self.merge_priority = v.parse()?;
        }
        if let Some(path) = get("CHROME_PATH") {
            self.browser.executable = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `http_timeout_ms` and `fast_time_budget_ms` must be greater than 0
    /// - `default_results` and `max_results` must be greater than 0
    /// - `default_results` must be <= `max_results`
    /// - endpoints and default language must not be blank
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.http_timeout_ms == 0 {
            return Err(SearchError::Config(
                "http_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.fast_time_budget_ms == 0 {
            return Err(SearchError::Config(
                "fast_time_budget_ms must be greater than 0".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.default_results == 0 || self.default_results > self.max_results {
            return Err(SearchError::Config(
                "default_results must be between 1 and max_results".into(),
            ));
        }
        if self.fast_endpoint.trim().is_empty()
            || self.deep_endpoint.trim().is_empty()
            || self.wiki_endpoint.trim().is_empty()
        {
            return Err(SearchError::Config("engine endpoints must not be blank".into()));
        }
        if self.default_language.trim().is_empty() {
            return Err(SearchError::Config(
                "default_language must not be blank".into(),
            ));
        }
        Ok(())
    }

    /// Clamp a requested result count into `[1, max_results]`.
    ///
    /// `None` selects `default_results`.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        let wanted = requested.unwrap_or(self.default_results);
        let clamped = wanted.clamp(1, self.max_results.max(1));
        if clamped != wanted {
            tracing::debug!(requested = wanted, clamped, "result limit clamped");
        }
        clamped
    }

    /// Resolve the language for a request, falling back to the default.
    pub fn effective_language<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(lang) if !lang.is_empty() => lang,
            _ => self.default_language.as_str(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, SearchError> {
    raw.trim()
        .parse()
        .map_err(|_| SearchError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.http_timeout_ms, 15_000);
        assert_eq!(config.fast_time_budget_ms, 1_800);
        assert_eq!(config.default_results, 5);
        assert_eq!(config.max_results, 50);
        assert_eq!(config.default_language, "en");
        assert_eq!(config.merge_priority, MergePriority::FastFirst);
        assert!(config.user_agent.is_none());
        assert!(config.browser.headless);
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SearchConfig {
            http_timeout_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http_timeout_ms"));
    }

    #[test]
    fn zero_budget_rejected() {
        let config = SearchConfig {
            fast_time_budget_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fast_time_budget_ms"));
    }

    #[test]
    fn default_above_max_rejected() {
        let config = SearchConfig {
            default_results: 20,
            max_results: 10,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_results"));
    }

    #[test]
    fn blank_endpoint_rejected() {
        let config = SearchConfig {
            fast_endpoint: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_applied() {
        let mut config = SearchConfig::default();
        config
            .apply_overrides(lookup(&[
                ("USER_AGENT", "CustomBot/1.0"),
                ("LANG_DEFAULT", "vi"),
                ("HTTP_TIMEOUT", "9000"),
                ("FAST_TIME_BUDGET_MS", "1200"),
                ("MAX_RESULTS", "20"),
                ("MERGE_PRIORITY", "deep_first"),
                ("CHROME_PATH", "/usr/bin/chromium"),
            ]))
            .expect("overrides should apply");
        assert_eq!(config.user_agent.as_deref(), Some("CustomBot/1.0"));
        assert_eq!(config.default_language, "vi");
        assert_eq!(config.http_timeout_ms, 9000);
        assert_eq!(config.fast_time_budget_ms, 1200);
        assert_eq!(config.max_results, 20);
        assert_eq!(config.merge_priority, MergePriority::DeepFirst);
        assert_eq!(
            config.browser.executable,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
    }

    #[test]
    fn blank_env_values_ignored() {
        let mut config = SearchConfig::default();
        config
            .apply_overrides(lookup(&[("USER_AGENT", "  "), ("HTTP_TIMEOUT", "")]))
            .expect("blank values are skipped");
        assert!(config.user_agent.is_none());
        assert_eq!(config.http_timeout_ms, 15_000);
    }

    #[test]
    fn unparsable_env_value_rejected() {
        let mut config = SearchConfig::default();
        let err = config
            .apply_overrides(lookup(&[("HTTP_TIMEOUT", "fifteen")]))
            .unwrap_err();
        assert!(err.to_string().contains("HTTP_TIMEOUT"));
    }

    #[test]
    fn effective_limit_clamps_into_range() {
        let config = SearchConfig {
            max_results: 10,
            ..Default::default()
        };
        assert_eq!(config.effective_limit(None), 5);
        assert_eq!(config.effective_limit(Some(0)), 1);
        assert_eq!(config.effective_limit(Some(7)), 7);
        assert_eq!(config.effective_limit(Some(99)), 10);
    }

    #[test]
    fn effective_language_falls_back_to_default() {
        let config = SearchConfig::default();
        assert_eq!(config.effective_language(None), "en");
        assert_eq!(config.effective_language(Some("  ")), "en");
        assert_eq!(config.effective_language(Some("vi")), "vi");
    }

    #[test]
    fn partial_toml_table_uses_defaults() {
        let json = serde_json::json!({ "fast_time_budget_ms": 900 });
        let config: SearchConfig = serde_json::from_value(json).expect("deserialize");
        assert_eq!(config.fast_time_budget_ms, 900);
        assert_eq!(config.http_timeout_ms, 15_000);
        assert_eq!(config.browser.viewport_width, 1366);
    }
}
