//! Stdin/stdout JSON bridge for the tool registry.
//!
//! Reads newline-delimited JSON [`ToolRequest`] messages, runs each through
//! the [`ToolRegistry`], and writes one [`ToolResponse`] line per request.
//! Requests run concurrently, so responses may come back out of order; the
//! `id` ties them together.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::error::{Result, ToolError};
use crate::host::contract::{LIST_TOOLS, PARSE_ERROR_ID, ToolRequest, ToolResponse};
use crate::tools::{StandardTools, ToolRegistry};

/// Maximum number of tool calls running at once.
const MAX_IN_FLIGHT: usize = 8;

/// Capacity of the response queue feeding the writer task.
const RESPONSE_CAPACITY: usize = 64;

/// Run the bridge on the process's stdin and stdout until stdin closes.
///
/// On exit the shared headless browser is shut down, whether or not the
/// bridge ended cleanly.
pub async fn run_stdio_bridge(tools: StandardTools) -> Result<()> {
    let StandardTools { registry, browser } = tools;
    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());

    let outcome = serve(Arc::new(registry), reader, writer).await;
    browser.shutdown().await;
    outcome.map(|_| ())
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
///
/// Waits for in-flight calls to finish after EOF, then returns the writer.
///
/// # Errors
///
/// Returns [`ToolError::Io`] if reading a line or writing a response fails.
pub async fn serve<R, W>(registry: Arc<ToolRegistry>, reader: R, writer: W) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<ToolResponse>(RESPONSE_CAPACITY);
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let read_outcome = dispatch_lines(registry, reader, tx).await;

    // Every sender is gone once dispatch returns and its tasks have
    // finished, so the writer drains the queue and stops.
    let writer = writer_task
        .await
        .map_err(|e| ToolError::Io(format!("response writer panicked: {e}")))??;
    read_outcome?;
    Ok(writer)
}

async fn dispatch_lines<R>(
    registry: Arc<ToolRegistry>,
    reader: R,
    tx: mpsc::Sender<ToolResponse>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let permits = Arc::new(Semaphore::new(MAX_IN_FLIGHT));
    let mut calls = JoinSet::new();
    let mut lines = reader.lines();

    let outcome = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("stdin closed (EOF); shutting down bridge");
                break Ok(());
            }
            Err(e) => break Err(ToolError::Io(format!("failed to read request: {e}"))),
        };

        if tx.is_closed() {
            tracing::warn!("response writer stopped; no longer reading requests");
            break Ok(());
        }

        // Reap finished calls so the set does not grow unbounded.
        while calls.try_join_next().is_some() {}

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request = match ToolRequest::parse_line(trimmed) {
            Ok(request) => request,
            Err(message) => {
                tracing::warn!(error = %message, "rejected malformed request line");
                if tx.send(ToolResponse::error(PARSE_ERROR_ID, message)).await.is_err() {
                    break Ok(());
                }
                continue;
            }
        };

        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break Ok(());
        };
        let registry = Arc::clone(&registry);
        let tx = tx.clone();
        calls.spawn(async move {
            let response = handle_request(&registry, request).await;
            drop(permit);
            // The writer only goes away after an output failure, which
            // `serve` reports.
            let _ = tx.send(response).await;
        });
    };

    drop(tx);
    while let Some(joined) = calls.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "tool call task failed");
        }
    }
    outcome
}

/// Run one request to completion and build its response.
pub async fn handle_request(registry: &ToolRegistry, request: ToolRequest) -> ToolResponse {
    let ToolRequest { id, tool, arguments } = request;

    if tool == LIST_TOOLS {
        return ToolResponse::ok(id, serde_json::Value::Array(registry.schemas_for_api()));
    }

    match registry.execute(&tool, arguments).await {
        Ok(result) if result.success => {
            ToolResponse::ok(id, serde_json::Value::String(result.content))
                .with_truncated(result.truncated)
        }
        Ok(result) => ToolResponse::error(
            id,
            result
                .error
                .unwrap_or_else(|| format!("{tool} failed without a message")),
        ),
        Err(e) => {
            tracing::debug!(tool = %tool, error = %e, "tool call rejected");
            ToolResponse::error(id, e.to_string())
        }
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::Receiver<ToolResponse>) -> Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let json = serde_json::to_string(&response)
            .map_err(|e| ToolError::Protocol(format!("failed to serialize response: {e}")))?;
        write_line(&mut writer, &json).await?;
    }
    Ok(writer)
}

/// Write a single JSON line and flush.
async fn write_line<W>(writer: &mut W, json: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| ToolError::Io(format!("failed to write response: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| ToolError::Io(format!("failed to write newline: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| ToolError::Io(format!("failed to flush output: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolResult};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Sleeps for `args.ms`, then echoes `args.text`.
    struct SlowEcho;

    #[async_trait]
    impl Tool for SlowEcho {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo text after a delay"
        }
        fn schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {"text": {"type": "string"}, "ms": {"type": "integer"}},
                "required": ["text"]
            })
        }
        async fn execute(&self, args: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
            let text = args["text"]
                .as_str()
                .ok_or_else(|| ToolError::Validation("missing required argument: text".into()))?;
            if text == "fail" {
                return Ok(ToolResult::failure("echo refused".into()));
            }
            let ms = args["ms"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(ToolResult::bounded(text, 16))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(SlowEcho));
        Arc::new(reg)
    }

    async fn run(input: &str) -> Vec<ToolResponse> {
        let out = serve(registry(), input.as_bytes(), Vec::new())
            .await
            .expect("serve");
        String::from_utf8(out)
            .expect("utf8 output")
            .lines()
            .map(|l| serde_json::from_str(l).expect("response line"))
            .collect()
    }

    fn by_id<'a>(responses: &'a [ToolResponse], id: &str) -> &'a ToolResponse {
        responses
            .iter()
            .find(|r| r.id == id)
            .unwrap_or_else(|| panic!("no response for {id}"))
    }

    #[tokio::test]
    async fn successful_call_returns_content() {
        let responses =
            run("{\"id\":\"a\",\"tool\":\"echo\",\"arguments\":{\"text\":\"hi\"}}\n").await;
        assert_eq!(responses, vec![ToolResponse::ok("a", serde_json::json!("hi"))]);
    }

    #[tokio::test]
    async fn failures_and_unknown_tools_are_error_responses() {
        let input = concat!(
            "{\"id\":\"1\",\"tool\":\"echo\",\"arguments\":{\"text\":\"fail\"}}\n",
            "{\"id\":\"2\",\"tool\":\"echo\",\"arguments\":{}}\n",
            "{\"id\":\"3\",\"tool\":\"math_eval\",\"arguments\":{\"expr\":\"1+1\"}}\n",
        );
        let responses = run(input).await;
        assert_eq!(responses.len(), 3);

        let failed = by_id(&responses, "1");
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("echo refused"));

        let invalid = by_id(&responses, "2");
        assert!(invalid
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("[VALIDATION_FAILED]")));

        let unknown = by_id(&responses, "3");
        assert_eq!(
            unknown.error.as_deref(),
            Some("[UNKNOWN_TOOL] no tool named 'math_eval'")
        );
    }

    #[tokio::test]
    async fn malformed_line_gets_parse_error_and_bridge_continues() {
        let input = concat!(
            "this is not json\n",
            "\n",
            "{\"id\":\"ok\",\"tool\":\"echo\",\"arguments\":{\"text\":\"still here\"}}\n",
        );
        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        let parse_error = by_id(&responses, PARSE_ERROR_ID);
        assert!(!parse_error.ok);
        assert!(parse_error
            .error
            .as_deref()
            .is_some_and(|e| e.contains("failed to parse request")));
        assert!(by_id(&responses, "ok").ok);
    }

    #[tokio::test]
    async fn tools_list_returns_schemas() {
        let responses = run("{\"id\":\"l\",\"tool\":\"tools.list\"}\n").await;
        let content = responses[0].content.as_ref().expect("content");
        assert_eq!(content[0]["name"], "echo");
        assert_eq!(content[0]["parameters"]["required"], serde_json::json!(["text"]));
    }

    #[tokio::test]
    async fn truncation_is_flagged() {
        let responses = run(
            "{\"id\":\"t\",\"tool\":\"echo\",\"arguments\":{\"text\":\"0123456789abcdefXYZ\"}}\n",
        )
        .await;
        assert!(responses[0].ok);
        assert!(responses[0].truncated);
    }

    #[tokio::test]
    async fn slow_call_does_not_block_fast_call() {
        let input = concat!(
            "{\"id\":\"slow\",\"tool\":\"echo\",\"arguments\":{\"text\":\"slow\",\"ms\":400}}\n",
            "{\"id\":\"fast\",\"tool\":\"echo\",\"arguments\":{\"text\":\"fast\"}}\n",
        );
        let responses = run(input).await;
        let order: Vec<&str> = responses.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn eof_without_input_is_clean() {
        assert!(run("").await.is_empty());
    }
}
