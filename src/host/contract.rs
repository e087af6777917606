//! Wire messages for the host bridge.
//!
//! One request per line on stdin, one response per line on stdout:
//!
//! ```text
//! → {"id":"1","tool":"search_web","arguments":{"q":"rust","limit":3}}
//! ← {"id":"1","ok":true,"content":"{\n  \"modeUsed\": \"auto\", ..."}
//! → {"id":"2","tool":"tools.list"}
//! ← {"id":"2","ok":true,"content":[{"name":"fetch_url",...}]}
//! ```

use serde::{Deserialize, Serialize};

/// Pseudo-tool that lists the registered tools' schemas.
pub const LIST_TOOLS: &str = "tools.list";

/// Response id used when a line could not be parsed into a request.
pub const PARSE_ERROR_ID: &str = "parse-error";

/// A tool call from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub id: String,
    pub tool: String,
    /// Tool arguments; absent or `null` becomes an empty object.
    #[serde(default = "empty_object", deserialize_with = "object_or_empty")]
    pub arguments: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<serde_json::Value, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(if value.is_null() { empty_object() } else { value })
}

impl ToolRequest {
    #[must_use]
    pub fn new(id: impl Into<String>, tool: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            tool: tool.into(),
            arguments,
        }
    }

    /// Parse one protocol line.
    ///
    /// # Errors
    ///
    /// Returns a message suitable for a `parse-error` response when the
    /// line is not a request or its `id` or `tool` is blank.
    pub fn parse_line(line: &str) -> Result<Self, String> {
        let request: Self = serde_json::from_str(line)
            .map_err(|e| format!("failed to parse request: {e}"))?;
        if request.id.trim().is_empty() {
            return Err("request id cannot be empty".into());
        }
        if request.tool.trim().is_empty() {
            return Err("tool name cannot be empty".into());
        }
        Ok(request)
    }
}

/// The host's answer to one [`ToolRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub id: String,
    pub ok: bool,
    /// Tool output: a string for tools, a schema array for `tools.list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the content was cut to the output byte limit.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl ToolResponse {
    /// Build a successful response.
    #[must_use]
    pub fn ok(id: impl Into<String>, content: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            ok: true,
            content: Some(content),
            error: None,
            truncated: false,
        }
    }

    /// Build an error response.
    #[must_use]
    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: false,
            content: None,
            error: Some(message.into()),
            truncated: false,
        }
    }

    #[must_use]
    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_with_arguments() {
        let req = ToolRequest::parse_line(
            r#"{"id":"7","tool":"search_web","arguments":{"q":"rust","limit":3}}"#,
        )
        .expect("valid request");
        assert_eq!(req.id, "7");
        assert_eq!(req.tool, "search_web");
        assert_eq!(req.arguments["limit"], 3);
    }

    #[test]
    fn missing_or_null_arguments_become_empty_object() {
        let req = ToolRequest::parse_line(r#"{"id":"1","tool":"tools.list"}"#).expect("valid");
        assert_eq!(req.arguments, serde_json::json!({}));
        let req = ToolRequest::parse_line(r#"{"id":"1","tool":"tools.list","arguments":null}"#)
            .expect("valid");
        assert_eq!(req.arguments, serde_json::json!({}));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(ToolRequest::parse_line("not json").is_err());
        assert!(ToolRequest::parse_line(r#"{"tool":"search_web"}"#).is_err());
        let err = ToolRequest::parse_line(r#"{"id":" ","tool":"search_web"}"#).unwrap_err();
        assert!(err.contains("id"));
        let err = ToolRequest::parse_line(r#"{"id":"1","tool":""}"#).unwrap_err();
        assert!(err.contains("tool"));
    }

    #[test]
    fn ok_response_omits_error_and_truncated() {
        let resp = ToolResponse::ok("1", serde_json::json!("hello"));
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json, serde_json::json!({"id": "1", "ok": true, "content": "hello"}));
    }

    #[test]
    fn error_response_omits_content() {
        let resp = ToolResponse::error(PARSE_ERROR_ID, "bad json");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"id": "parse-error", "ok": false, "error": "bad json"})
        );
    }

    #[test]
    fn truncated_flag_is_serialized_when_set() {
        let resp = ToolResponse::ok("1", serde_json::json!("abc")).with_truncated(true);
        let json = serde_json::to_string(&resp).expect("serialize");
        assert!(json.contains(r#""truncated":true"#));
        let parsed: ToolResponse = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, resp);
    }
}
