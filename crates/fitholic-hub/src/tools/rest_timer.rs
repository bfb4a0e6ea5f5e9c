//! Rest timer tool — acknowledges a rest period; the client runs the countdown.

use async_trait::async_trait;
use serde_json::{Value, json};

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::tool::{Tool, ToolContext};
use fitholic_core::voice::commands::{DEFAULT_REST_SECS, START_REST_TIMER};

/// Longest rest we accept, in seconds.
const MAX_REST_SECS: u64 = 600;

pub struct RestTimerTool;

impl RestTimerTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RestTimerTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for RestTimerTool {
    fn name(&self) -> &str {
        START_REST_TIMER
    }

    fn description(&self) -> &str {
        "Start a rest timer"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "duration": {
                    "type": "integer",
                    "description": "Rest duration in seconds (default 60)"
                }
            }
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<Value> {
        let duration = match &args["duration"] {
            Value::Null => DEFAULT_REST_SECS,
            value => value
                .as_u64()
                .filter(|d| (1..=MAX_REST_SECS).contains(d))
                .ok_or_else(|| FitholicError::InvalidArguments {
                    tool: START_REST_TIMER.into(),
                    message: format!("'duration' must be between 1 and {} seconds", MAX_REST_SECS),
                })?,
        };

        Ok(json!({
            "success": true,
            "duration": duration,
            "message": format!("Started {} second rest timer", duration),
        }))
    }
}
