//! Math evaluation tool.

use async_trait::async_trait;
use serde::Deserialize;

use crate::calc::{self, DEFAULT_PRECISION, MAX_PRECISION, MIN_PRECISION, NumberMode};
use crate::error::ToolError;

use super::types::{Tool, ToolResult, to_pretty_json};

/// Tool that evaluates an arithmetic expression and returns
/// `{mode, result, valueType}` as JSON.
///
/// # Arguments (JSON)
///
/// - `expression` (string, required): e.g. `sqrt(2) * 10^3` or `1/3 + 1/6`
/// - `mode` (string, optional): `number`, `BigNumber` (default) or `Fraction`
/// - `precision` (integer, optional): significant digits, 16 to 256 (default 64)
#[derive(Debug, Default)]
pub struct MathEvalTool;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MathArgs {
    expression: String,
    #[serde(default)]
    mode: Option<NumberMode>,
    #[serde(default)]
    precision: Option<u64>,
}

impl MathEvalTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for MathEvalTool {
    fn name(&self) -> &str {
        "math_eval"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Supports + - * / % ^ !, parentheses, \
         pi and e, and functions such as sqrt, abs, round, min, max, log and sin. \
         BigNumber mode avoids binary rounding errors; Fraction mode gives exact n/d results."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Expression to evaluate, e.g. \"(1.1 + 2.2) * 3\""
                },
                "mode": {
                    "type": "string",
                    "enum": ["number", "BigNumber", "Fraction"],
                    "description": "Number representation (default \"BigNumber\")"
                },
                "precision": {
                    "type": "integer",
                    "minimum": MIN_PRECISION,
                    "maximum": MAX_PRECISION,
                    "default": DEFAULT_PRECISION,
                    "description": "Significant digits of the result"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: MathArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::Validation(format!("invalid math_eval arguments: {e}")))?;

        let precision = match args.precision {
            None => DEFAULT_PRECISION,
            Some(p) => u32::try_from(p)
                .ok()
                .filter(|p| (MIN_PRECISION..=MAX_PRECISION).contains(p))
                .ok_or_else(|| {
                    ToolError::Validation(format!(
                        "precision must be between {MIN_PRECISION} and {MAX_PRECISION}, got {p}"
                    ))
                })?,
        };
        let mode = args.mode.unwrap_or_default();

        match calc::evaluate(&args.expression, mode, precision) {
            Ok(evaluation) => Ok(ToolResult::success(to_pretty_json(&evaluation)?)),
            Err(e) if e.is_input_error() => Err(ToolError::Validation(e.to_string())),
            Err(e) => {
                tracing::debug!(error = %e, %mode, "expression has no value");
                Ok(ToolResult::failure(format!("Failed to evaluate: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(args: serde_json::Value) -> serde_json::Value {
        let result = MathEvalTool::new().execute(args).await.expect("execute");
        assert!(result.success, "{result:?}");
        serde_json::from_str(&result.content).expect("json")
    }

    #[tokio::test]
    async fn defaults_to_bignumber() {
        let out = run(serde_json::json!({"expression": "0.1 + 0.2"})).await;
        assert_eq!(
            out,
            serde_json::json!({"mode": "BigNumber", "result": "0.3", "valueType": "BigNumber"})
        );
    }

    #[tokio::test]
    async fn each_mode_is_selectable() {
        let number = run(serde_json::json!({"expression": "0.1 + 0.2", "mode": "number", "precision": 17})).await;
        assert_eq!(number["result"], "0.30000000000000004");
        assert_eq!(number["valueType"], "number");

        let fraction = run(serde_json::json!({"expression": "0.1 + 0.2", "mode": "Fraction"})).await;
        assert_eq!(fraction["result"], "3/10");

        let big = run(serde_json::json!({"expression": "1/3", "mode": "BigNumber", "precision": 16})).await;
        assert_eq!(big["result"], "0.3333333333333333");
    }

    #[tokio::test]
    async fn precision_bounds() {
        for precision in [16, 256] {
            let out = run(serde_json::json!({"expression": "2/3", "precision": precision})).await;
            let digits = out["result"].as_str().unwrap_or_default().len() - "0.".len();
            assert_eq!(digits, precision);
        }
        for precision in [0, 15, 257, 1u64 << 40] {
            let err = MathEvalTool::new()
                .execute(serde_json::json!({"expression": "1", "precision": precision}))
                .await
                .unwrap_err();
            assert!(matches!(err, ToolError::Validation(_)), "{precision}: {err}");
            assert!(err.to_string().contains("between 16 and 256"), "{err}");
        }
    }

    #[tokio::test]
    async fn malformed_input_is_validation_error() {
        for args in [
            serde_json::json!({}),
            serde_json::json!({"expression": "1 +"}),
            serde_json::json!({"expression": "1", "mode": "decimal"}),
            serde_json::json!({"expression": "1", "radix": 2}),
            serde_json::json!({"expression": "nope(3)"}),
        ] {
            let err = MathEvalTool::new().execute(args.clone()).await.unwrap_err();
            assert!(matches!(err, ToolError::Validation(_)), "{args}: {err}");
        }
    }

    #[tokio::test]
    async fn valueless_expression_is_failed_result() {
        let result = MathEvalTool::new()
            .execute(serde_json::json!({"expression": "1/0", "mode": "Fraction"}))
            .await
            .expect("domain errors are reported in the result");
        assert!(!result.success);
        let error = result.error.unwrap_or_default();
        assert!(error.starts_with("Failed to evaluate: math error: division by zero"), "{error}");
    }

    #[test]
    fn schema_lists_modes_and_bounds() {
        let schema = MathEvalTool::new().schema();
        assert_eq!(
            schema["properties"]["mode"]["enum"],
            serde_json::json!(["number", "BigNumber", "Fraction"])
        );
        assert_eq!(schema["properties"]["precision"]["minimum"], 16);
        assert_eq!(schema["properties"]["precision"]["maximum"], 256);
        assert_eq!(schema["properties"]["precision"]["default"], 64);
    }
}
