//! Tool registry.
//!
//! The [`ToolRegistry`] holds registered tools, provides lookup by name,
//! dispatches calls, and exports JSON schemas for tool listings.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ToolError;

use super::types::{Tool, ToolResult};

/// Registry of available tools, keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::debug!(tool = %name, "replaced registered tool");
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Names of all registered tools, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.values().map(|t| t.name()).collect();
        names.sort_unstable();
        names
    }

    /// Export JSON schemas for all tools, sorted by name.
    ///
    /// Each entry contains `name`, `description`, and `parameters` (the schema).
    pub fn schemas_for_api(&self) -> Vec<serde_json::Value> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "parameters": t.schema(),
                })
            })
            .collect()
    }

    /// Run the tool registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] if nothing is registered under
    /// `name`, otherwise whatever the tool returns.
    pub async fn execute(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let started = std::time::Instant::now();
        let outcome = tool.execute(args).await;
        tracing::debug!(
            tool = name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.as_ref().is_ok_and(|r| r.success),
            "tool finished"
        );
        outcome
    }

    /// Check if a tool exists in the registry.
    pub fn exists(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticTool {
        name: &'static str,
        output: &'static str,
    }

    #[async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "Returns a fixed string"
        }
        fn schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _args: serde_json::Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::success(self.output.to_string()))
        }
    }

    fn registry_with(names: &[&'static str]) -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        for &name in names {
            reg.register(Arc::new(StaticTool { name, output: name }));
        }
        reg
    }

    #[test]
    fn empty_registry() {
        let reg = ToolRegistry::new();
        assert!(reg.is_empty());
        assert!(reg.list().is_empty());
        assert!(reg.schemas_for_api().is_empty());
        assert!(reg.get("search_web").is_none());
    }

    #[test]
    fn list_is_sorted() {
        let reg = registry_with(&["wiki_get", "fetch_url", "search_web"]);
        assert_eq!(reg.list(), vec!["fetch_url", "search_web", "wiki_get"]);
        assert_eq!(reg.len(), 3);
        assert!(reg.exists("fetch_url"));
        assert!(!reg.exists("math_eval"));
    }

    #[test]
    fn register_replaces_same_name() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(StaticTool { name: "t", output: "first" }));
        reg.register(Arc::new(StaticTool { name: "t", output: "second" }));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn schemas_have_api_shape() {
        let reg = registry_with(&["b_tool", "a_tool"]);
        let schemas = reg.schemas_for_api();
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0]["name"], "a_tool");
        assert_eq!(schemas[1]["name"], "b_tool");
        for schema in &schemas {
            assert!(schema["description"].is_string());
            assert_eq!(schema["parameters"]["type"], "object");
        }
    }

    #[tokio::test]
    async fn execute_dispatches_by_name() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(StaticTool { name: "t", output: "first" }));
        reg.register(Arc::new(StaticTool { name: "t", output: "second" }));
        let result = reg
            .execute("t", serde_json::json!({}))
            .await
            .expect("registered tool");
        assert_eq!(result.content, "second");
    }

    #[tokio::test]
    async fn execute_unknown_tool_is_error() {
        let reg = registry_with(&["search_web"]);
        let err = reg
            .execute("summarize_url", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "summarize_url"));
    }

    #[test]
    fn debug_lists_names() {
        let reg = registry_with(&["fetch_url"]);
        assert_eq!(format!("{reg:?}"), r#"ToolRegistry { tools: ["fetch_url"] }"#);
    }
}
