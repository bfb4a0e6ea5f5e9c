//! Voice command interpreter — parse, execute, respond over the ongoing workout log.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::commands::{self, VoiceCommand};
use crate::error::Result;
use crate::llm::{LlmClient, parse_json_reply};
use crate::provider::ChatRequest;
use crate::tool::{ToolContext, ToolRegistry, succeeded};
use crate::workout::{Exercise, LogExercise, WorkoutLog, WorkoutTemplate};

/// Per-utterance snapshot. Rebuilt from the stored log on every call.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub current_exercise: Option<(LogExercise, Option<Exercise>)>,
    pub template: Option<WorkoutTemplate>,
    pub completed_exercises: usize,
    pub total_exercises: usize,
}

impl CommandContext {
    pub async fn load(ctx: &ToolContext, log: &WorkoutLog) -> Result<Self> {
        let current_exercise = match log.current_exercise() {
            Some(entry) => Some((entry.clone(), ctx.exercises.get(&entry.exercise_id).await?)),
            None => None,
        };
        let template = match &log.template_id {
            Some(id) => ctx.templates.get(id).await?,
            None => None,
        };
        Ok(Self {
            current_exercise,
            template,
            completed_exercises: log.exercises.iter().filter(|e| e.completed).count(),
            total_exercises: log.exercises.len(),
        })
    }

    /// Prompt block describing where the user is in the workout.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some((entry, exercise)) = &self.current_exercise {
            let progress = entry.progress();
            let mut block = vec![
                "Current Exercise:".to_string(),
                format!(
                    "- Name: {}",
                    exercise.as_ref().map(|e| e.name.as_str()).unwrap_or(&entry.exercise_id)
                ),
            ];
            if let Some(exercise) = exercise {
                if let Some(description) = &exercise.description {
                    block.push(format!("- Description: {}", description));
                }
                if !exercise.equipment.is_empty() {
                    block.push(format!("- Equipment: {}", exercise.equipment.join(", ")));
                }
            }
            block.push(format!(
                "- Progress: {} out of {} sets completed",
                progress.completed_sets, progress.total_sets
            ));
            parts.push(block.join("\n"));
        }
        if let Some(template) = &self.template {
            parts.push(format!(
                "Workout Progress:\n- Name: {}\n- Progress: {}/{} exercises completed",
                template.name, self.completed_exercises, self.total_exercises
            ));
        }
        if parts.is_empty() {
            "No exercise in progress.".to_string()
        } else {
            parts.join("\n\n")
        }
    }
}

/// Outcome of one interpreted utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceOutcome {
    pub transcription: String,
    /// `{type, args, result}` of the executed tool.
    pub command: Value,
    pub response_text: String,
}

pub struct VoiceInterpreter {
    llm: LlmClient,
    tools: Arc<ToolRegistry>,
}

impl VoiceInterpreter {
    pub fn new(llm: LlmClient, tools: Arc<ToolRegistry>) -> Self {
        Self { llm, tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the three stages. Errors only when the parse-stage LLM is unreachable.
    pub async fn interpret(&self, ctx: &ToolContext, transcription: &str) -> Result<VoiceOutcome> {
        let log = ctx.load_log().await?;
        let snapshot = CommandContext::load(ctx, &log).await?;

        let command = self.parse(transcription, &snapshot).await?;
        let result = match &command {
            Some(cmd) => {
                info!("Voice command for {}: {} {}", ctx.user_id, cmd.tool, cmd.args);
                self.tools.execute(&cmd.tool, ctx, cmd.args.clone()).await
            }
            None => json!({ "success": false, "error": "Failed to understand command" }),
        };
        let command_record = match &command {
            Some(cmd) => json!({ "type": cmd.tool, "args": cmd.args, "result": result }),
            None => json!({ "type": "error", "result": result }),
        };

        let response_text = self.respond(&command_record, &snapshot).await;
        Ok(VoiceOutcome {
            transcription: transcription.to_string(),
            command: command_record,
            response_text,
        })
    }

    /// Regex fast path, then the LLM. `Ok(None)` means the reply was unusable.
    async fn parse(
        &self,
        transcription: &str,
        snapshot: &CommandContext,
    ) -> Result<Option<VoiceCommand>> {
        if let Some(command) = commands::parse_with_patterns(transcription) {
            debug!("Voice command matched fast path: {}", command.tool);
            return Ok(Some(command));
        }

        let system = format!(
            "You turn spoken workout commands into tool calls.\n\n\
             {}\n\n\
             Available tools:\n{}\n\n\
             Return a JSON object with two fields:\n\
             1. \"tool\": one of {}\n\
             2. \"args\": the arguments for the tool as an object\n\n\
             Example: for \"log 10 reps at 135 pounds\" return \
             {{\"tool\": \"log_set\", \"args\": {{\"reps\": 10, \"weight\": 135}}}}",
            snapshot.describe(),
            self.tools.describe(),
            commands::TOOL_NAMES.join(", ")
        );
        let request = ChatRequest::prompt(&system, transcription)
            .with_schema(
                "voice_command",
                json!({
                    "type": "object",
                    "properties": {
                        "tool": { "type": "string", "enum": commands::TOOL_NAMES },
                        "args": { "type": "object" }
                    },
                    "required": ["tool", "args"]
                }),
            )
            .with_temperature(0.0);

        let reply = self.llm.complete(request).await?;
        match parse_json_reply::<VoiceCommand>(&reply) {
            Ok(command) => Ok(Some(command)),
            Err(e) => {
                warn!("Could not parse voice command reply: {}", e);
                Ok(None)
            }
        }
    }

    /// Paraphrase the result. Falls back to fixed text when the LLM fails.
    async fn respond(&self, command: &Value, snapshot: &CommandContext) -> String {
        let system = "You are a workout voice assistant. Generate a natural, concise response to the user \
                      about what was done. If there was an error, explain what went wrong and how to fix it. \
                      Keep the response brief and friendly; it will be spoken aloud.";
        let user = format!("Command executed: {}\n\n{}", command, snapshot.describe());
        match self.llm.complete(ChatRequest::prompt(system, &user)).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => fallback_response(command),
            Err(e) => {
                warn!("Voice response generation failed, using fixed text: {}", e);
                fallback_response(command)
            }
        }
    }
}

/// Deterministic response text for a command record.
pub fn fallback_response(command: &Value) -> String {
    let result = &command["result"];
    if !succeeded(result) {
        let error = result["error"].as_str().unwrap_or("something went wrong");
        return format!("Sorry, I couldn't do that: {}.", error.trim_end_matches('.'));
    }
    if let Some(message) = result["message"].as_str() {
        return message.to_string();
    }
    match command["type"].as_str().unwrap_or_default() {
        commands::LOG_SET => format!(
            "Set logged. {} of {} sets done.",
            result["completed_sets"], result["total_sets"]
        ),
        commands::NAVIGATE_EXERCISE => match result["next_exercise"]["name"].as_str() {
            Some(name) => format!("Moving on to {}.", name),
            None => "All exercises are done. Say finish workout when you're ready.".to_string(),
        },
        commands::COMPLETE_SESSION => "Workout complete. Great job!".to_string(),
        commands::GET_EXERCISE_INFO => format!(
            "You've completed {} of {} sets, {} to go.",
            result["completed_sets"], result["total_sets"], result["remaining_sets"]
        ),
        _ => "Done.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryWorkoutStore, WorkoutLogStore, WorkoutTemplateStore};
    use crate::testing::ScriptedProvider;
    use crate::tool::Tool;
    use crate::workout::TemplateExercise;
    use async_trait::async_trait;

    /// Stand-in for the real set logger: fills one set on the stored log.
    struct LogSetTool;

    #[async_trait]
    impl Tool for LogSetTool {
        fn name(&self) -> &str {
            commands::LOG_SET
        }
        fn description(&self) -> &str {
            "Log a completed exercise set"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value> {
            let mut log = ctx.load_log().await?;
            let reps = args["reps"].as_u64().unwrap_or(0) as u32;
            let progress = log.log_set(reps, args["weight"].as_f64().unwrap_or(0.0))?.progress();
            ctx.logs.update(&log).await?;
            Ok(json!({"success": true, "completed_sets": progress.completed_sets, "total_sets": progress.total_sets}))
        }
    }

    async fn setup() -> (ToolContext, Arc<InMemoryWorkoutStore>) {
        let store = Arc::new(InMemoryWorkoutStore::new());
        let template = WorkoutTemplate {
            template_id: "t1".into(),
            user_id: None,
            name: "Legs".into(),
            description: None,
            difficulty: "beginner".into(),
            duration: Some(30),
            exercises: vec![TemplateExercise {
                exercise_id: "squat".into(),
                sets: 3,
                reps: 10,
                rest_time: 60,
            }],
        };
        WorkoutTemplateStore::create(store.as_ref(), &template).await.unwrap();
        let mut log = WorkoutLog::from_template("u1", &template);
        log.start(chrono::Utc::now()).unwrap();
        WorkoutLogStore::create(store.as_ref(), &log).await.unwrap();

        let ctx = ToolContext {
            user_id: "u1".into(),
            log_id: log.log_id,
            logs: store.clone(),
            templates: store.clone(),
            exercises: store.clone(),
        };
        (ctx, store)
    }

    fn interpreter(provider: &Arc<ScriptedProvider>) -> VoiceInterpreter {
        let mut tools = ToolRegistry::new();
        tools.register(LogSetTool);
        VoiceInterpreter::new(provider.client(), Arc::new(tools))
    }

    #[tokio::test]
    async fn fast_path_executes_and_paraphrases() {
        let (ctx, store) = setup().await;
        let provider = ScriptedProvider::new(vec![Ok("Nice, first set of squats done!")]);

        let outcome = interpreter(&provider)
            .interpret(&ctx, "logged 10 reps at 100 pounds")
            .await
            .unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(outcome.command["type"], "log_set");
        assert_eq!(outcome.command["result"]["completed_sets"], 1);
        assert_eq!(outcome.response_text, "Nice, first set of squats done!");
        let log = WorkoutLogStore::get(store.as_ref(), &ctx.log_id).await.unwrap().unwrap();
        assert_eq!(log.exercises[0].completed_sets(), 1);
    }

    #[tokio::test]
    async fn llm_parse_then_fallback_response() {
        let (ctx, _) = setup().await;
        let provider = ScriptedProvider::new(vec![
            Ok(r#"{"tool": "log_set", "args": {"reps": 8, "weight": 50}}"#),
            Err("down"),
        ]);

        let outcome = interpreter(&provider)
            .interpret(&ctx, "that was eight at fifty")
            .await
            .unwrap();

        assert_eq!(outcome.command["args"]["reps"], 8);
        assert_eq!(outcome.response_text, "Set logged. 1 of 3 sets done.");
    }

    #[tokio::test]
    async fn unregistered_tool_reports_failure() {
        let (ctx, _) = setup().await;
        let provider = ScriptedProvider::new(vec![Err("down")]);

        let outcome = interpreter(&provider).interpret(&ctx, "help").await.unwrap();

        assert_eq!(outcome.command["result"]["success"], false);
        assert!(outcome.response_text.starts_with("Sorry, I couldn't do that"));
    }

    #[tokio::test]
    async fn parse_stage_outage_is_an_error() {
        let (ctx, _) = setup().await;
        let provider = ScriptedProvider::new(vec![Err("down")]);

        let result = interpreter(&provider).interpret(&ctx, "hmm what now").await;

        assert!(result.is_err());
    }
}
