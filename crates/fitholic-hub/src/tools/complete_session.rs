//! Complete session tool — finish the ongoing workout.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use fitholic_core::error::Result;
use fitholic_core::tool::{Tool, ToolContext};
use fitholic_core::voice::commands::COMPLETE_SESSION;

pub struct CompleteSessionTool;

impl CompleteSessionTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CompleteSessionTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CompleteSessionTool {
    fn name(&self) -> &str {
        COMPLETE_SESSION
    }

    fn description(&self) -> &str {
        "Complete the current workout session (every exercise must be done or skipped)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "notes": {
                    "type": ["string", "null"],
                    "description": "Optional notes about the workout"
                }
            }
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
        let notes = args["notes"]
            .as_str()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let mut log = ctx.load_log().await?;
        log.complete(Utc::now(), notes)?;
        ctx.logs.update(&log).await?;

        info!("Workout log {} completed by voice", log.log_id);
        Ok(json!({
            "success": true,
            "completed_exercises": log.exercises.iter().filter(|e| e.completed).count(),
            "total_exercises": log.exercises.len(),
            "duration": log.duration,
            "total_volume": log.total_volume(),
        }))
    }
}
