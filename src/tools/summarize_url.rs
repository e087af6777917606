//! Summarize URL tool: a short plain-text digest of a page.
//!
//! The bridge has no channel for asking the host's model to write a
//! summary, so the digest is the opening of the extracted text.

use std::sync::Arc;

use async_trait::async_trait;
use tiered_search::{SearchConfig, SearchError};

use crate::error::ToolError;

use super::types::{DEFAULT_MAX_BYTES, Tool, ToolResult, optional_str, required_str};

/// Characters of extracted text kept in a digest.
pub const DIGEST_CHARS: usize = 2_000;

const EMPTY_DIGEST: &str = "(no content to summarize)";

/// Tool that fetches a page (HTML or PDF) and returns the first
/// [`DIGEST_CHARS`] characters of its readable text.
///
/// # Arguments (JSON)
///
/// - `url` (string, required): the http(s) URL to summarize
/// - `lang` (string, optional): preferred content language
pub struct SummarizeUrlTool {
    config: Arc<SearchConfig>,
    max_bytes: usize,
}

impl SummarizeUrlTool {
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

/// The first `max_chars` characters of `text`, cut on a character boundary.
fn digest(text: &str, max_chars: usize) -> &str {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[async_trait]
impl Tool for SummarizeUrlTool {
    fn name(&self) -> &str {
        "summarize_url"
    }

    fn description(&self) -> &str {
        "Fetch a web page or PDF and return a short plain-text digest of its content."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The http or https URL to summarize"
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
                tracing::debug!(error = %e, "page fetch for digest failed");
                return Ok(ToolResult::failure(format!("Failed to summarize {url}: {e}")));
            }
        };

        let excerpt = digest(&page.text, DIGEST_CHARS);
        let excerpt = if excerpt.is_empty() { EMPTY_DIGEST } else { excerpt };
        Ok(ToolResult::bounded(excerpt, self.max_bytes))
    }
}
