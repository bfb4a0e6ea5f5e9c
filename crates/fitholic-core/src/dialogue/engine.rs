//! Dialogue engine — drives one message through the node graph.
//!
//! Entry is the router. `parse_message` loops back to the router once; every
//! other node ends the turn. Slot-filling continues across turns: a turn that
//! stops in `gathering_requirements` is resumed by the next one.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::exercise::ExerciseCreator;
use super::motivation::MotivationNode;
use super::parser::IntentParser;
use super::router::{Next, route};
use super::state::{ConversationState, TurnResult};
use super::workout::WorkoutPlanner;
use crate::generator::{ExerciseGenerator, WorkoutGenerator};
use crate::llm::LlmClient;
use crate::message::HistoryEntry;
use crate::store::ExerciseStore;

pub const DEFAULT_RESPONSE: &str = "Is there anything else I can help you with?";

/// Router visits allowed per turn; only parse_message loops back.
const MAX_ROUTES: usize = 4;

pub struct DialogueEngine {
    parser: IntentParser,
    exercise: ExerciseCreator,
    workout: WorkoutPlanner,
    motivation: MotivationNode,
}

impl DialogueEngine {
    pub fn new(
        llm: LlmClient,
        exercise_generator: Arc<dyn ExerciseGenerator>,
        workout_generator: Arc<dyn WorkoutGenerator>,
        exercises: Arc<dyn ExerciseStore>,
    ) -> Self {
        Self {
            parser: IntentParser::new(llm.clone()),
            exercise: ExerciseCreator::new(llm.clone(), exercise_generator),
            workout: WorkoutPlanner::new(llm.clone(), workout_generator, exercises),
            motivation: MotivationNode::new(llm),
        }
    }

    /// Process one message from a fresh `new_message` state.
    pub async fn process_message(
        &self,
        session_id: &str,
        user_id: &str,
        message: &str,
        chat_history: Vec<HistoryEntry>,
        user_profile: Map<String, Value>,
    ) -> TurnResult {
        let state = ConversationState::new(session_id, user_id, message, chat_history, user_profile);
        let state = self.run(state).await;
        turn_result(&state)
    }

    /// Traverse the graph from the router to `end`.
    pub async fn run(&self, mut state: ConversationState) -> ConversationState {
        for _ in 0..MAX_ROUTES {
            let next = route(state.current_state, state.current_intent.as_ref());
            info!(
                session = %state.session_id,
                "Router: {} -> {}",
                state.current_state,
                next
            );

            match next {
                Next::ParseMessage => {
                    self.parser.process(&mut state).await;
                    continue;
                }
                Next::CreateExercise => self.exercise.process(&mut state).await,
                Next::GenerateWorkout => self.workout.process(&mut state).await,
                Next::Motivate => self.motivation.process(&mut state).await,
                Next::End => {}
            }
            return end(state);
        }

        warn!(session = %state.session_id, "Router loop limit reached, ending turn");
        end(state)
    }
}

/// Terminal node: guarantees a response.
fn end(mut state: ConversationState) -> ConversationState {
    if state.response.as_deref().is_none_or(|r| r.trim().is_empty()) {
        state.response = Some(DEFAULT_RESPONSE.to_string());
    }
    state
}

pub fn turn_result(state: &ConversationState) -> TurnResult {
    TurnResult {
        session_id: state.session_id.clone(),
        response: state
            .response
            .clone()
            .unwrap_or_else(|| DEFAULT_RESPONSE.to_string()),
        current_state: state.current_state,
        error: state.error.clone(),
        created_exercise: state.created_exercise.clone(),
        generated_workout: state.generated_workout.clone(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::exercise::INITIAL_PROMPT;
    use crate::dialogue::state::ChatState;
    use crate::store::InMemoryWorkoutStore;
    use crate::testing::{FakeExerciseGenerator, FakeWorkoutGenerator, ScriptedProvider};

    fn engine(provider: &Arc<ScriptedProvider>) -> DialogueEngine {
        let store = Arc::new(InMemoryWorkoutStore::new());
        DialogueEngine::new(
            provider.client(),
            FakeExerciseGenerator::ok(),
            FakeWorkoutGenerator::new(store.clone(), false),
            store,
        )
    }

    #[tokio::test]
    async fn two_turn_exercise_creation() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"{"type": "create_exercise", "confidence": 0.95, "parameters": {}}"#,
        )]);
        let engine = engine(&provider);

        let first = engine
            .run(ConversationState::new("s1", "u1", "create a new exercise", Vec::new(), Map::new()))
            .await;
        assert_eq!(first.current_state, ChatState::GatheringRequirements);
        assert_eq!(first.response.as_deref(), Some(INITIAL_PROMPT));
        let pending = first.pending().unwrap();

        let second = engine
            .run(
                ConversationState::new("s1", "u1", "strength exercise for chest", Vec::new(), Map::new())
                    .resume(pending),
            )
            .await;

        // Only the first turn's parse hit the LLM.
        assert_eq!(provider.calls(), 1);
        assert_eq!(second.current_state, ChatState::ExerciseCreated);
        assert!(second.created_exercise.is_some());
        assert!(second.response.is_some());
        assert!(second.pending().is_none());
    }

    #[tokio::test]
    async fn low_confidence_goes_to_motivation() {
        let provider = ScriptedProvider::new(vec![
            Ok(r#"{"type": "create_exercise", "confidence": 0.5, "parameters": {}}"#),
            Ok("Keep moving!"),
        ]);
        let result = engine(&provider)
            .process_message("s1", "u1", "maybe something?", Vec::new(), Map::new())
            .await;

        assert_eq!(result.current_state, ChatState::Motivated);
        assert!(result.response.starts_with("Keep moving!"));
    }

    #[tokio::test]
    async fn total_llm_outage_still_answers() {
        let provider = ScriptedProvider::new(vec![Err("down"), Err("down")]);
        let result = engine(&provider)
            .process_message("s1", "u1", "hello", Vec::new(), Map::new())
            .await;

        assert_eq!(result.current_state, ChatState::Motivated);
        assert!(!result.response.is_empty());
    }

    #[tokio::test]
    async fn gathering_without_handled_intent_ends_with_default() {
        let provider = ScriptedProvider::new(vec![]);
        let mut state = ConversationState::new("s1", "u1", "ok", Vec::new(), Map::new());
        state.current_state = ChatState::GatheringRequirements;

        let state = engine(&provider).run(state).await;

        assert_eq!(provider.calls(), 0);
        assert_eq!(state.response.as_deref(), Some(DEFAULT_RESPONSE));
    }
}
