//! Log set tool — record a completed set on the current exercise.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::tool::{Tool, ToolContext};
use fitholic_core::voice::commands::LOG_SET;

pub struct LogSetTool;

impl LogSetTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogSetTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for LogSetTool {
    fn name(&self) -> &str {
        LOG_SET
    }

    fn description(&self) -> &str {
        "Log a completed exercise set"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reps": {
                    "type": "integer",
                    "description": "Number of repetitions completed"
                },
                "weight": {
                    "type": "number",
                    "description": "Weight used in pounds (0 for bodyweight)"
                }
            },
            "required": ["reps"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
        let reps = args["reps"]
            .as_u64()
            .or_else(|| args["reps"].as_f64().filter(|r| *r >= 0.0).map(|r| r as u64))
            .and_then(|r| u32::try_from(r).ok())
            .ok_or_else(|| FitholicError::InvalidArguments {
                tool: LOG_SET.into(),
                message: "'reps' must be a non-negative whole number".into(),
            })?;
        let weight = args["weight"].as_f64().unwrap_or(0.0);
        if weight < 0.0 {
            return Err(FitholicError::InvalidArguments {
                tool: LOG_SET.into(),
                message: "'weight' must not be negative".into(),
            });
        }

        let mut log = ctx.load_log().await?;
        let exercise = log.log_set(reps, weight)?.clone();
        ctx.logs.update(&log).await?;

        let progress = exercise.progress();
        info!(
            "Logged {} reps at {} for {} ({}/{})",
            reps, weight, exercise.exercise_id, progress.completed_sets, progress.total_sets
        );
        Ok(json!({
            "success": true,
            "exercise_id": exercise.exercise_id,
            "reps": reps,
            "weight": weight,
            "sets_completed": progress.completed_sets,
            "completed_sets": progress.completed_sets,
            "total_sets": progress.total_sets,
            "exercise_completed": exercise.completed,
        }))
    }
}
