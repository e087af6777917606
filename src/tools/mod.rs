//! Tool system for the host bridge.
//!
//! Provides a registry-based tool architecture with JSON Schema metadata
//! and bounded output.
//!
//! # Tools
//!
//! - **search_web**: tiered web search (fast HTML engine, browser escalation)
//! - **fetch_url**: fetch a page and extract its readable content
//! - **summarize_url**: short plain-text digest of a page
//! - **wiki_get**: Wikipedia article summary
//! - **math_eval**: arithmetic in double, big decimal or fraction mode

pub mod fetch_url;
pub mod math_eval;
pub mod registry;
pub mod summarize_url;
pub mod types;
pub mod web_search;
pub mod wiki_get;

use std::sync::Arc;

use tiered_search::BrowserSession;

pub use fetch_url::FetchUrlTool;
pub use math_eval::MathEvalTool;
pub use registry::ToolRegistry;
pub use summarize_url::SummarizeUrlTool;
pub use types::{DEFAULT_MAX_BYTES, Tool, ToolResult, truncate_output};
pub use web_search::{WebSearch, WebSearchTool};
pub use wiki_get::WikiGetTool;

use crate::config::ToolsConfig;
use crate::error::Result;

/// The standard tool set plus the browser session it shares.
///
/// The host keeps the session so it can shut the browser down on exit.
pub struct StandardTools {
    pub registry: ToolRegistry,
    pub browser: BrowserSession,
}

/// Build the registry with every standard tool, configured from `config`.
///
/// No browser is launched here; the deep engine starts it on first use.
///
/// # Errors
///
/// Returns [`ToolError::Config`](crate::ToolError::Config) if the
/// configuration is invalid.
pub fn standard_tools(config: &ToolsConfig) -> Result<StandardTools> {
    config.validate()?;
    let search = WebSearch::from_config(config.search.clone())?;
    let browser = search.browser().clone();
    let shared = Arc::new(config.search.clone());
    let max_bytes = config.max_output_bytes;

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(
        WebSearchTool::new(Arc::new(search)).with_max_bytes(max_bytes),
    ));
    registry.register(Arc::new(
        FetchUrlTool::new(Arc::clone(&shared)).with_max_bytes(max_bytes),
    ));
    registry.register(Arc::new(
        SummarizeUrlTool::new(Arc::clone(&shared)).with_max_bytes(max_bytes),
    ));
    registry.register(Arc::new(WikiGetTool::new(shared).with_max_bytes(max_bytes)));
    registry.register(Arc::new(MathEvalTool::new()));

    Ok(StandardTools { registry, browser })
}
