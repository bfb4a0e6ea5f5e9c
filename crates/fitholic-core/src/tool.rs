//! Tool system — the closed set of operations voice commands can run
//! against the user's ongoing workout log.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{FitholicError, Result};
use crate::store::{ExerciseStore, WorkoutLogStore, WorkoutTemplateStore};
use crate::workout::WorkoutLog;

/// Everything a tool may touch while handling one utterance.
#[derive(Clone)]
pub struct ToolContext {
    pub user_id: String,
    /// The ongoing log the utterance applies to.
    pub log_id: String,
    pub logs: Arc<dyn WorkoutLogStore>,
    pub templates: Arc<dyn WorkoutTemplateStore>,
    pub exercises: Arc<dyn ExerciseStore>,
}

impl ToolContext {
    /// Re-read the log; tools never trust an earlier snapshot.
    pub async fn load_log(&self) -> Result<WorkoutLog> {
        self.logs
            .get(&self.log_id)
            .await?
            .ok_or_else(|| FitholicError::NotFound(format!("Workout log {}", self.log_id)))
    }
}

/// Abstract tool trait — one voice-command capability.
///
/// # Example
///
/// ```rust,ignore
/// struct PingTool;
///
/// #[async_trait]
/// impl Tool for PingTool {
///     fn name(&self) -> &str { "ping" }
///     fn description(&self) -> &str { "Check the assistant is listening" }
///     fn parameters(&self) -> Value { json!({"type": "object", "properties": {}}) }
///
///     async fn execute(&self, _ctx: &ToolContext, _args: Value) -> Result<Value> {
///         Ok(json!({"success": true, "message": "pong"}))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in parsed commands.
    fn name(&self) -> &str;

    /// Description shown to the command parser.
    fn description(&self) -> &str;

    /// JSON Schema for tool arguments.
    fn parameters(&self) -> Value;

    /// Execute the tool. The returned object carries `success: true`.
    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value>;
}

/// Registry for managing tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        tracing::debug!("Registered tool: {}", name);
        self.tools.insert(name, Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// `- name: description (args schema)` lines for the command prompt, sorted by name.
    pub fn describe(&self) -> String {
        let mut lines: Vec<String> = self
            .tools
            .values()
            .map(|t| format!("- {}: {} (args: {})", t.name(), t.description(), t.parameters()))
            .collect();
        lines.sort();
        lines.join("\n")
    }

    /// Execute a tool by name. Failures come back as `{success: false, error}`.
    pub async fn execute(&self, name: &str, ctx: &ToolContext, args: Value) -> Value {
        let Some(tool) = self.tools.get(name) else {
            let err = FitholicError::ToolNotFound(name.to_string());
            tracing::warn!("{}", err);
            return failure(&err);
        };

        tracing::info!("Executing tool: {} with args: {}", name, args);

        match tool.execute(ctx, args).await {
            Ok(result) => {
                tracing::debug!("Tool {} completed: {}", name, result);
                result
            }
            Err(e) => {
                tracing::error!("Tool {} failed: {}", name, e);
                failure(&e)
            }
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The failure shape every tool error is converted into.
pub fn failure(error: &FitholicError) -> Value {
    json!({ "success": false, "error": error.to_string() })
}

/// Whether a tool result reports success.
pub fn succeeded(result: &Value) -> bool {
    result.get("success").and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryWorkoutStore;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo arguments"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
            if args.get("load").is_some() {
                ctx.load_log().await?;
            }
            Ok(json!({"success": true, "args": args}))
        }
    }

    fn context() -> ToolContext {
        let store = Arc::new(InMemoryWorkoutStore::new());
        ToolContext {
            user_id: "u1".into(),
            log_id: "missing".into(),
            logs: store.clone(),
            templates: store.clone(),
            exercises: store,
        }
    }

    #[tokio::test]
    async fn unknown_tool_and_errors_become_failures() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        let ctx = context();

        let ok = registry.execute("echo", &ctx, json!({"x": 1})).await;
        assert!(succeeded(&ok));

        let missing = registry.execute("dance", &ctx, json!({})).await;
        assert!(!succeeded(&missing));
        assert!(missing["error"].as_str().unwrap().contains("dance"));

        let not_found = registry.execute("echo", &ctx, json!({"load": true})).await;
        assert!(!succeeded(&not_found));
        assert!(not_found["error"].as_str().unwrap().contains("not found"));
    }
}
