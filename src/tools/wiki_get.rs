//! Encyclopedia summary tool.

use std::sync::Arc;

use async_trait::async_trait;
use tiered_search::{SearchConfig, SearchError};

use crate::error::ToolError;

use super::types::{DEFAULT_MAX_BYTES, Tool, ToolResult, optional_str, required_str, to_pretty_json};

/// Tool that returns the Wikipedia summary of an article as JSON.
///
/// A missing article still yields a summary carrying the article URL.
///
/// # Arguments (JSON)
///
/// - `title` (string, required): article title, e.g. `Hà Nội`
/// - `lang` (string, optional): language edition, e.g. `vi`
pub struct WikiGetTool {
    config: Arc<SearchConfig>,
    max_bytes: usize,
}

impl WikiGetTool {
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
impl Tool for WikiGetTool {
    fn name(&self) -> &str {
        "wiki_get"
    }

    fn description(&self) -> &str {
        "Get the Wikipedia summary of an article: title, short description, lead extract and URL."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Article title"
                },
                "lang": {
                    "type": "string",
                    "description": format!(
                        "Wikipedia language edition (default \"{}\")",
                        self.config.default_language
                    )
                }
            },
            "required": ["title"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ToolError> {
        let title = required_str(&args, "title")?;
        let lang = optional_str(&args, "lang")?;

        let summary = match tiered_search::wiki_summary(title, lang, &self.config).await {
            Ok(summary) => summary,
            Err(e @ SearchError::InvalidInput(_)) => return Err(e.into()),
            Err(e) => {
                tracing::debug!(error = %e, "wiki summary failed");
                return Ok(ToolResult::failure(format!(
                    "Failed to get wiki summary for \"{title}\": {e}"
                )));
            }
        };

        let json = to_pretty_json(&summary)?;
        Ok(ToolResult::bounded(&json, self.max_bytes))
    }
}
