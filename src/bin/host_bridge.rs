//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! Reads tool requests as newline-delimited JSON from stdin, runs them
//! through the standard tool registry, and writes one response line per
//! request to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use web_tools::config::ToolsConfig;
use web_tools::host::run_stdio_bridge;
use web_tools::tools::standard_tools;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise tracing to stderr only (stdout is reserved for the JSON
    // protocol).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "web-tools-host starting");

    let config = ToolsConfig::from_env()
        .map_err(|e| anyhow::anyhow!("web-tools-host configuration invalid: {e}"))?;
    let tools = standard_tools(&config)?;
    tracing::info!(tools = ?tools.registry.list(), "tools registered");

    run_stdio_bridge(tools).await.map_err(|e| {
        tracing::error!(error = %e, "web-tools-host exited with error");
        anyhow::anyhow!("web-tools-host failed: {e}")
    })?;

    tracing::info!("web-tools-host shut down cleanly");
    Ok(())
}
