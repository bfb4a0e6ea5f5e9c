//! Intent parser node — classifies a message through a structured LLM call.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use super::state::{ChatState, ConversationState, Intent, IntentType};
use crate::error::Result;
use crate::llm::LlmClient;
use crate::message::recent_turns;
use crate::provider::ChatRequest;

const HISTORY_TURNS: usize = 3;

const INTENTS: &[(&str, &str, &str, &str)] = &[
    (
        "log_workout",
        "Log a completed workout session",
        "workout_type, duration",
        "exercises, intensity, notes",
    ),
    (
        "create_exercise",
        "Create a new exercise in the library",
        "exercise_type, target_muscles",
        "equipment, difficulty, considerations",
    ),
    (
        "generate_workout",
        "Generate a workout plan",
        "duration",
        "type, equipment, target_muscles, intensity",
    ),
];

fn intent_descriptions() -> String {
    INTENTS
        .iter()
        .map(|(name, description, required, optional)| {
            format!(
                "- {}: {}\n  Required: [{}]\n  Optional: [{}]",
                name, description, required, optional
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn system_prompt() -> String {
    format!(
        "You are an AI assistant specialized in understanding fitness-related queries.\n\
         Your task is to:\n\
         1. Identify the user's primary intent\n\
         2. Extract relevant parameters\n\
         3. Assign a confidence score\n\n\
         Available intents and their parameters:\n{}\n\n\
         Respond with a JSON object with:\n\
         - type: The identified intent (one of: log_workout, create_exercise, generate_workout)\n\
         - confidence: A score between 0 and 1 (e.g., 0.8 for high confidence)\n\
         - parameters: Extracted parameters matching the intent's requirements",
        intent_descriptions()
    )
}

fn intent_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "type": { "type": "string", "enum": ["log_workout", "create_exercise", "generate_workout", "unknown"] },
            "confidence": { "type": "number" },
            "parameters": { "type": "object" }
        },
        "required": ["type", "confidence", "parameters"]
    })
}

/// Shape the LLM is asked to produce; confidence is validated afterwards.
#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(rename = "type")]
    kind: IntentType,
    confidence: f64,
    #[serde(default)]
    parameters: Map<String, Value>,
}

pub struct IntentParser {
    llm: LlmClient,
}

impl IntentParser {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Classify `state.current_message` and move to `intent_parsed`.
    ///
    /// Mid slot-filling the existing intent is kept and no LLM call is made.
    /// Any failure degrades to the unknown intent.
    pub async fn process(&self, state: &mut ConversationState) {
        if state.current_state == ChatState::GatheringRequirements {
            info!("IntentParser: gathering requirements, keeping current intent");
            return;
        }

        let intent = match self.classify(state).await {
            Ok(intent) => {
                info!(
                    "IntentParser: {} (confidence {:.2}, {} params)",
                    intent.kind.as_str(),
                    intent.confidence(),
                    intent.parameters.len()
                );
                intent
            }
            Err(e) => {
                warn!("IntentParser: falling back to unknown intent: {}", e);
                Intent::unknown()
            }
        };

        state.current_intent = Some(intent);
        state.current_state = ChatState::IntentParsed;
    }

    async fn classify(&self, state: &ConversationState) -> Result<Intent> {
        let mut user = vec!["Recent conversation:".to_string()];
        user.extend(recent_turns(&state.chat_history, HISTORY_TURNS));
        user.push("\nCurrent message:".to_string());
        user.push(state.current_message.clone());

        let request = ChatRequest::prompt(&system_prompt(), &user.join("\n"))
            .with_schema("intent", intent_schema())
            .with_temperature(0.0);
        let raw: RawIntent = self.llm.complete_json(request).await?;
        Ok(Intent::new(raw.kind, raw.confidence, raw.parameters))
    }
}
