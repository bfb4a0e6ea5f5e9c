//! Exercise creation node — gathers requirements, then calls the exercise generator.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{error, info};

use super::slots::{self, Gathered};
use super::state::{ChatState, ConversationState};
use crate::error::Result;
use crate::generator::{ExerciseGenerator, ExerciseRequirements};
use crate::llm::LlmClient;
use crate::workout::Exercise;

pub const INITIAL_PROMPT: &str = "What type of exercise would you like to create? Please specify the type (e.g., strength, cardio, flexibility) and target muscle groups.";

const FALLBACK_QUESTION: &str = "What type of exercise would you like to create?";

pub const ERROR_RESPONSE: &str =
    "I encountered an error while creating the exercise. Please try again with different parameters.";

const REQUIRED: &[&str] = &["exercise_type", "target_muscles"];

fn gathering_prompt(current_info: &str) -> String {
    format!(
        "You are an AI assistant helping users create exercises.\n\
         Based on the conversation, identify what information is still needed.\n\n\
         Required information:\n\
         - Exercise type (e.g., strength, cardio, flexibility)\n\
         - Target muscle groups\n\n\
         Optional information:\n\
         - Available equipment\n\
         - Desired difficulty level\n\
         - Special considerations\n\n\
         Current information:\n{}\n\n\
         Format your response as a question to gather the missing required information.\n\
         If all required information is present, respond with \"{}\".",
        current_info,
        slots::COMPLETE
    )
}

pub struct ExerciseCreator {
    llm: LlmClient,
    generator: Arc<dyn ExerciseGenerator>,
}

impl ExerciseCreator {
    pub fn new(llm: LlmClient, generator: Arc<dyn ExerciseGenerator>) -> Self {
        Self { llm, generator }
    }

    pub async fn process(&self, state: &mut ConversationState) {
        if state.current_message.trim().eq_ignore_ascii_case("create a new exercise") {
            info!("ExerciseCreator: initial request, asking for details");
            state.current_state = ChatState::GatheringRequirements;
            state.response = Some(INITIAL_PROMPT.to_string());
            return;
        }

        let Some(intent) = state.current_intent.as_mut() else {
            state.fail("no intent to create an exercise from", ERROR_RESPONSE);
            return;
        };
        extract_from_message(&mut intent.parameters, &state.current_message);
        let current = Value::Object(intent.parameters.clone());
        info!("ExerciseCreator: current parameters {}", current);

        match self.gather(&intent.parameters).await {
            Gathered::Ask(question) => {
                info!("ExerciseCreator: asking \"{}\"", question);
                state.current_state = ChatState::GatheringRequirements;
                state.response = Some(question);
                return;
            }
            Gathered::Complete => {}
        }

        let params = intent.parameters.clone();
        match self.create(&params).await {
            Ok(exercise) => {
                info!("ExerciseCreator: created exercise {}", exercise.name);
                state.current_state = ChatState::ExerciseCreated;
                state.response = Some(success_message(&exercise));
                state.created_exercise = Some(exercise);
            }
            Err(e) => {
                error!("ExerciseCreator: {}", e);
                state.fail(e, ERROR_RESPONSE);
            }
        }
    }

    async fn gather(&self, params: &Map<String, Value>) -> Gathered {
        if REQUIRED.iter().all(|key| slots::is_present(params, key)) {
            info!("ExerciseCreator: all required information present");
            return Gathered::Complete;
        }
        let prompt = gathering_prompt(&slots::describe_params(params));
        slots::next_question(&self.llm, &prompt, FALLBACK_QUESTION).await
    }

    async fn create(&self, params: &Map<String, Value>) -> Result<Exercise> {
        let requirements = ExerciseRequirements::from_params(params)?;
        self.generator.generate(&requirements).await
    }
}

/// Keyword extraction of the required slots, before any LLM call.
fn extract_from_message(params: &mut Map<String, Value>, message: &str) {
    slots::fill_missing(
        params,
        "exercise_type",
        slots::find_keyword(message, slots::EXERCISE_TYPES).map(|t| json!(t)),
    );
    let muscles = slots::find_keywords(message, slots::MUSCLE_GROUPS);
    slots::fill_missing(
        params,
        "target_muscles",
        (!muscles.is_empty()).then(|| json!(muscles)),
    );
}

fn success_message(exercise: &Exercise) -> String {
    let equipment = if exercise.equipment.is_empty() {
        "None".to_string()
    } else {
        exercise.equipment.join(", ")
    };
    format!(
        "I've created a new exercise: {}\n\n\
         Description: {}\n\
         Target Muscles: {}\n\
         Equipment Needed: {}\n\
         Difficulty: {}\n\n\
         Would you like me to show you the detailed instructions?",
        exercise.name,
        exercise.description.as_deref().unwrap_or(""),
        exercise.muscle_groups.join(", "),
        equipment,
        exercise.difficulty.as_deref().unwrap_or("intermediate"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::state::{Intent, IntentType};
    use crate::error::FitholicError;
    use crate::testing::{FakeExerciseGenerator, ScriptedProvider};

    fn gathering(message: &str, params: Value) -> ConversationState {
        let mut st = ConversationState::new("s1", "u1", message, Vec::new(), Map::new());
        st.current_state = ChatState::GatheringRequirements;
        st.current_intent = Some(Intent::new(
            IntentType::CreateExercise,
            0.9,
            params.as_object().cloned().unwrap_or_default(),
        ));
        st
    }

    #[tokio::test]
    async fn keywords_complete_without_llm() {
        let provider = ScriptedProvider::new(vec![]);
        let generator = FakeExerciseGenerator::ok();
        let node = ExerciseCreator::new(provider.client(), generator.clone());
        let mut st = gathering("strength exercise for chest", json!({}));

        node.process(&mut st).await;

        assert_eq!(provider.calls(), 0);
        assert_eq!(st.current_state, ChatState::ExerciseCreated);
        let seen = generator.last().unwrap();
        assert_eq!(seen.exercise_type, "strength");
        assert_eq!(seen.target_muscles, vec!["chest"]);
        assert!(st.response.unwrap().starts_with("I've created a new exercise"));
    }

    #[tokio::test]
    async fn missing_slot_asks_llm_question() {
        let provider = ScriptedProvider::new(vec![Ok("Which muscles do you want to target?")]);
        let node = ExerciseCreator::new(provider.client(), FakeExerciseGenerator::ok());
        let mut st = gathering("something cardio", json!({}));

        node.process(&mut st).await;

        assert_eq!(provider.calls(), 1);
        assert!(provider.prompt(0).contains("- exercise_type: cardio"));
        assert_eq!(st.current_state, ChatState::GatheringRequirements);
        assert_eq!(st.response.as_deref(), Some("Which muscles do you want to target?"));
    }

    #[tokio::test]
    async fn llm_failure_asks_fallback_question() {
        let provider = ScriptedProvider::new(vec![Err("timeout")]);
        let node = ExerciseCreator::new(provider.client(), FakeExerciseGenerator::ok());
        let mut st = gathering("hmm", json!({}));

        node.process(&mut st).await;

        assert_eq!(st.current_state, ChatState::GatheringRequirements);
        assert_eq!(st.response.as_deref(), Some(FALLBACK_QUESTION));
    }

    #[tokio::test]
    async fn generator_failure_sets_error_state() {
        let provider = ScriptedProvider::new(vec![]);
        let generator = FakeExerciseGenerator::failing(FitholicError::Generation("boom".into()));
        let node = ExerciseCreator::new(provider.client(), generator);
        let mut st = gathering("balance work for core", json!({}));

        node.process(&mut st).await;

        assert_eq!(st.current_state, ChatState::Error);
        assert!(st.error.unwrap().contains("boom"));
        assert_eq!(st.response.as_deref(), Some(ERROR_RESPONSE));
        assert!(st.created_exercise.is_none());
    }

    #[tokio::test]
    async fn llm_claiming_complete_too_early_is_a_validation_error() {
        let provider = ScriptedProvider::new(vec![Ok("COMPLETE")]);
        let node = ExerciseCreator::new(provider.client(), FakeExerciseGenerator::ok());
        let mut st = gathering("strength please", json!({}));

        node.process(&mut st).await;

        assert_eq!(st.current_state, ChatState::Error);
        assert!(st.error.unwrap().contains("target_muscles"));
    }

    #[tokio::test]
    async fn initial_command_gets_fixed_prompt() {
        let provider = ScriptedProvider::new(vec![]);
        let node = ExerciseCreator::new(provider.client(), FakeExerciseGenerator::ok());
        let mut st = ConversationState::new("s1", "u1", "Create a new exercise", Vec::new(), Map::new());
        st.current_intent = Some(Intent::new(IntentType::CreateExercise, 0.9, Map::new()));

        node.process(&mut st).await;

        assert_eq!(st.current_state, ChatState::GatheringRequirements);
        assert_eq!(st.response.as_deref(), Some(INITIAL_PROMPT));
        assert_eq!(provider.calls(), 0);
    }
}
