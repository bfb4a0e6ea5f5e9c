//! Navigate tool — move between exercises of the ongoing workout.

use async_trait::async_trait;
use serde_json::{Value, json};

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::tool::{Tool, ToolContext};
use fitholic_core::voice::commands::NAVIGATE_EXERCISE;
use fitholic_core::workout::NavAction;

pub struct NavigateExerciseTool;

impl NavigateExerciseTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NavigateExerciseTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for NavigateExerciseTool {
    fn name(&self) -> &str {
        NAVIGATE_EXERCISE
    }

    fn description(&self) -> &str {
        "Navigate to next or previous exercise, or skip current exercise"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["next", "previous", "skip"],
                    "description": "Navigation action to take"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
        let action = args["action"]
            .as_str()
            .and_then(NavAction::parse)
            .ok_or_else(|| FitholicError::InvalidArguments {
                tool: NAVIGATE_EXERCISE.into(),
                message: "'action' must be one of next, previous, skip".into(),
            })?;

        let mut log = ctx.load_log().await?;
        let current = log.navigate(action)?;
        ctx.logs.update(&log).await?;

        let next_exercise = match current {
            Some(idx) => {
                let entry = &log.exercises[idx];
                let details = ctx.exercises.get(&entry.exercise_id).await?;
                let progress = entry.progress();
                let (name, description) = match details {
                    Some(d) => (d.name, d.description),
                    None => (entry.exercise_id.clone(), None),
                };
                json!({
                    "exercise_id": entry.exercise_id,
                    "name": name,
                    "description": description,
                    "sets_completed": progress.completed_sets,
                    "total_sets": progress.total_sets,
                })
            }
            None => Value::Null,
        };

        Ok(json!({
            "success": true,
            "action": action,
            "next_exercise": next_exercise,
        }))
    }
}
