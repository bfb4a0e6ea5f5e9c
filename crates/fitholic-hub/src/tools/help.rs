//! Help tool — lists what the user can say.

use async_trait::async_trait;
use serde_json::{Value, json};

use fitholic_core::error::Result;
use fitholic_core::tool::{Tool, ToolContext};
use fitholic_core::voice::commands::HELP;

pub const HELP_TEXT: &str = "Available commands:
1. Log a set: \"logged X reps at Y pounds\"
2. Navigate: \"next exercise\", \"previous exercise\", \"skip this exercise\"
3. Rest timer: \"start rest timer for X seconds\"
4. Complete workout: \"finish workout\", \"end session\"
5. Exercise info: \"how many sets left\", \"show progress\"";

pub struct HelpTool;

impl HelpTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HelpTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HelpTool {
    fn name(&self) -> &str {
        HELP
    }

    fn description(&self) -> &str {
        "Get help about available commands"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _ctx: &ToolContext, _args: Value) -> Result<Value> {
        Ok(json!({ "success": true, "message": HELP_TEXT }))
    }
}
