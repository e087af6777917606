//! # web-tools
//!
//! Web search and retrieval tools for assistants, served over a
//! newline-delimited JSON bridge on stdin/stdout.
//!
//! - **search_web**: tiered search through [`tiered_search`], fast HTML
//!   scraping first with escalation to a shared headless browser
//! - **fetch_url**: readable text and metadata of a page or PDF
//! - **summarize_url**: the opening of a page's readable text
//! - **wiki_get**: Wikipedia article summaries
//! - **math_eval**: expression evaluation through [`calc`], with double,
//!   big decimal and exact fraction modes
//!
//! The `web-tools-host` binary wires these together: it loads
//! [`config::ToolsConfig`], builds the registry with
//! [`tools::standard_tools`], and runs [`host::run_stdio_bridge`] until
//! stdin closes.

pub mod calc;
pub mod config;
pub mod error;
pub mod host;
pub mod tools;

pub use config::ToolsConfig;
pub use error::{Result, ToolError};
