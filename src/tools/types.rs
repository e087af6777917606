//! Core tool types.
//!
//! Defines the async [`Tool`] trait that every tool implements and
//! [`ToolResult`] for capturing bounded execution output.

use async_trait::async_trait;

use crate::error::ToolError;

/// Default maximum output size (100 KB).
pub const DEFAULT_MAX_BYTES: usize = 100 * 1024;

/// Result of a tool execution.
///
/// Contains the output content (bounded to the tool's byte limit),
/// success/error status, and whether the output was truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Whether the tool execution succeeded.
    pub success: bool,
    /// Output content (bounded).
    pub content: String,
    /// Error message if the tool execution failed.
    pub error: Option<String>,
    /// Whether the output was truncated to fit the byte limit.
    pub truncated: bool,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(content: String) -> Self {
        Self {
            success: true,
            content,
            error: None,
            truncated: false,
        }
    }

    /// Create a failed tool result with an error message.
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            content: String::new(),
            error: Some(error),
            truncated: false,
        }
    }

    /// Create a successful result from `content`, truncated to `max_bytes`.
    pub fn bounded(content: &str, max_bytes: usize) -> Self {
        let (content, truncated) = truncate_output(content, max_bytes);
        Self {
            success: true,
            content,
            error: None,
            truncated,
        }
    }
}

/// Truncate a string to at most `max_bytes`, respecting UTF-8 boundaries.
///
/// Returns `(truncated_string, was_truncated)`.
pub fn truncate_output(s: &str, max_bytes: usize) -> (String, bool) {
    if s.len() <= max_bytes {
        return (s.to_string(), false);
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    (
        format!("{}\n\n[output truncated at {max_bytes} bytes]", &s[..end]),
        true,
    )
}

/// Read a required, non-blank string argument.
pub(crate) fn required_str<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    let value = args
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::Validation(format!("missing required argument: {key}")))?;
    if value.trim().is_empty() {
        return Err(ToolError::Validation(format!("{key} must not be empty")));
    }
    Ok(value)
}

/// Read an optional string argument; `null` counts as absent.
pub(crate) fn optional_str<'a>(
    args: &'a serde_json::Value,
    key: &str,
) -> Result<Option<&'a str>, ToolError> {
    match args.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ToolError::Validation(format!("{key} must be a string"))),
    }
}

/// Serialize a tool's structured output for the caller.
pub(crate) fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ToolError::Execution(format!("failed to encode output: {e}")))
}

/// A tool callable through the registry and the host bridge.
///
/// All tools must be `Send + Sync`: one instance serves concurrent calls.
/// The trait provides metadata (name, description, schema) and an async
/// execution method that accepts JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (e.g. "search_web", "fetch_url").
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's arguments.
    fn schema(&self) -> serde_json::Value;

    /// Execute the tool with the given JSON arguments.
    ///
    /// Failures of the remote operation are reported as a failed
    /// [`ToolResult`]; malformed arguments are an `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] for bad arguments and
    /// [`ToolError::Execution`] when output cannot be produced.
    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ToolError>;
}
