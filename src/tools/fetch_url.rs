//! Fetch URL tool: downloads a web page and extracts readable text content.

use std::sync::Arc;

use async_trait::async_trait;
use tiered_search::{SearchConfig, SearchError};

use crate::error::ToolError;

use super::types::{DEFAULT_MAX_BYTES, Tool, ToolResult, optional_str, required_str, to_pretty_json};

/// Tool that fetches a web page and extracts readable text content.
///
/// Downloads the page at the given URL, strips boilerplate (navigation, ads,
/// footers, scripts), and returns the main content with its metadata as
/// JSON.
///
/// # Arguments (JSON)
///
/// - `url` (string, required): the http(s) URL to fetch
/// - `lang` (string, optional): preferred content language
pub struct FetchUrlTool {
    config: Arc<SearchConfig>,
    max_bytes: usize,
}

impl FetchUrlTool {
    pub fn new(config: Arc<SearchConfig>) -> Self {
        Self {
            config,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    /// Override the output byte limit.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl Tool for FetchUrlTool {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch a web page or PDF and extract its readable text content, title, author and site name. PDFs also report their page count."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The http or https URL to fetch and extract content from"
                },
                "lang": {
                    "type": "string",
                    "description": "Preferred content language, e.g. \"en\" or \"vi\""
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ToolError> {
        let url = required_str(&args, "url")?.trim();
        let lang = optional_str(&args, "lang")?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::Validation(
                "url must start with http:// or https://".into(),
            ));
        }

        let page = match tiered_search::fetch_page_content(url, lang, &self.config).await {
            Ok(page) => page,
            Err(e @ SearchError::InvalidInput(_)) => return Err(e.into()),
            Err(e) => {
                tracing::debug!(error = %e, "page fetch failed");
                return Ok(ToolResult::failure(format!("Failed to fetch {url}: {e}")));
            }
        };

        let json = to_pretty_json(&page)?;
        Ok(ToolResult::bounded(&json, self.max_bytes))
    }
}
