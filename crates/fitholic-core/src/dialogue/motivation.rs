//! Motivation node — friendly chit-chat when no actionable intent was found.

use tracing::{info, warn};

use super::state::{ChatState, ConversationState};
use crate::llm::LlmClient;
use crate::message::recent_turns;
use crate::provider::ChatRequest;

const SUGGESTIONS: &str = "\n\nWould you like to:\n1. Create a new exercise\n2. Generate a workout plan\n3. Learn more about other features";

pub const FALLBACK_RESPONSE: &str = "I'm here to help you with your fitness journey! I can create exercises, generate workouts, and provide guidance. What would you like to try first?";

fn system_prompt(history: &str) -> String {
    format!(
        "You are an enthusiastic and knowledgeable fitness assistant.\n\
         Your role is to:\n\
         1. Be encouraging and motivational\n\
         2. Provide clear guidance about available features\n\
         3. Help users understand how you can assist them\n\
         4. Keep responses concise but informative\n\n\
         Available features you can help with:\n\
         1. Create personalized exercises based on user preferences and goals\n\
         2. Generate workout plans that fit user's schedule and equipment\n\
         3. Log and track workout sessions by voice during a workout\n\n\
         Current conversation context:\n{}\n\n\
         Respond in a friendly, motivational tone. If the user seems interested in a specific feature,\n\
         encourage them to try it by providing a clear example of how to use it.",
        history
    )
}

pub struct MotivationNode {
    llm: LlmClient,
}

impl MotivationNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    pub async fn process(&self, state: &mut ConversationState) {
        let turns = recent_turns(&state.chat_history, 3);
        let history = if turns.is_empty() {
            "No previous context".to_string()
        } else {
            turns.join("\n")
        };

        let request = ChatRequest::prompt(&system_prompt(&history), &state.current_message);
        state.response = Some(match self.llm.complete(request).await {
            Ok(reply) if !reply.is_empty() => {
                info!("MotivationNode: replied with {} chars", reply.len());
                format!("{}{}", reply, SUGGESTIONS)
            }
            Ok(_) => FALLBACK_RESPONSE.to_string(),
            Err(e) => {
                warn!("MotivationNode: LLM failed, using canned reply: {}", e);
                FALLBACK_RESPONSE.to_string()
            }
        });
        state.current_state = ChatState::Motivated;
    }
}
