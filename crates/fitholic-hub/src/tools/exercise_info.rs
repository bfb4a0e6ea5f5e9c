//! Exercise info tool — set progress on the current exercise.

use async_trait::async_trait;
use serde_json::{Value, json};

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::tool::{Tool, ToolContext};
use fitholic_core::voice::commands::GET_EXERCISE_INFO;

pub struct ExerciseInfoTool;

impl ExerciseInfoTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExerciseInfoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ExerciseInfoTool {
    fn name(&self) -> &str {
        GET_EXERCISE_INFO
    }

    fn description(&self) -> &str {
        "Get information about current exercise progress"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, ctx: &ToolContext, _args: Value) -> Result<Value> {
        let log = ctx.load_log().await?;
        let entry = log
            .current_exercise()
            .ok_or_else(|| FitholicError::Validation("No exercise in progress".into()))?;
        let details = ctx.exercises.get(&entry.exercise_id).await?;
        let progress = entry.progress();

        Ok(json!({
            "success": true,
            "exercise_id": entry.exercise_id,
            "name": details.map(|d| d.name),
            "completed_sets": progress.completed_sets,
            "total_sets": progress.total_sets,
            "remaining_sets": progress.remaining_sets,
        }))
    }
}
