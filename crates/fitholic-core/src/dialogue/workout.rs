//! Workout generation node — gathers the plan length, then calls the workout generator.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use super::slots::{self, Gathered};
use super::state::{ChatState, ConversationState};
use crate::error::Result;
use crate::generator::{WorkoutGenerator, WorkoutRequirements};
use crate::llm::LlmClient;
use crate::store::ExerciseStore;
use crate::workout::WorkoutTemplate;

const FALLBACK_QUESTION: &str = "How many minutes would you like your workout to last?";

pub const ERROR_RESPONSE: &str =
    "I encountered an error while generating the workout. Please try again with different parameters.";

const REQUIRED: &[&str] = &["duration"];

fn gathering_prompt(current_info: &str) -> String {
    format!(
        "You are an AI assistant helping users create workout plans.\n\
         Based on the conversation, identify what information is still needed.\n\n\
         Required information:\n\
         - Duration (in minutes)\n\n\
         Optional information:\n\
         - Workout type (strength, cardio, hiit, etc.)\n\
         - Target muscle groups\n\
         - Available equipment\n\
         - Desired intensity\n\n\
         Current information:\n{}\n\n\
         Format your response as a question to gather the missing required information.\n\
         If all required information is present, respond with \"{}\".",
        current_info,
        slots::COMPLETE
    )
}

pub struct WorkoutPlanner {
    llm: LlmClient,
    generator: Arc<dyn WorkoutGenerator>,
    exercises: Arc<dyn ExerciseStore>,
}

impl WorkoutPlanner {
    pub fn new(
        llm: LlmClient,
        generator: Arc<dyn WorkoutGenerator>,
        exercises: Arc<dyn ExerciseStore>,
    ) -> Self {
        Self {
            llm,
            generator,
            exercises,
        }
    }

    pub async fn process(&self, state: &mut ConversationState) {
        let Some(intent) = state.current_intent.as_mut() else {
            state.fail("no intent to generate a workout from", ERROR_RESPONSE);
            return;
        };
        extract_from_message(&mut intent.parameters, &state.current_message);

        if let Gathered::Ask(question) = self.gather(&intent.parameters).await {
            info!("WorkoutPlanner: asking \"{}\"", question);
            state.current_state = ChatState::GatheringRequirements;
            state.response = Some(question);
            return;
        }

        let params = intent.parameters.clone();
        match self.generate(&state.user_id, &state.user_profile, &params).await {
            Ok((template, requirements)) => {
                info!(
                    "WorkoutPlanner: generated \"{}\" with {} exercises",
                    template.name,
                    template.exercises.len()
                );
                state.current_state = ChatState::WorkoutGenerated;
                state.response = Some(self.summary(&template, &requirements).await);
                state.generated_workout = Some(template);
            }
            Err(e) => {
                error!("WorkoutPlanner: {}", e);
                state.fail(e, ERROR_RESPONSE);
            }
        }
    }

    async fn gather(&self, params: &Map<String, Value>) -> Gathered {
        if REQUIRED.iter().all(|key| slots::is_present(params, key)) {
            return Gathered::Complete;
        }
        let prompt = gathering_prompt(&slots::describe_params(params));
        slots::next_question(&self.llm, &prompt, FALLBACK_QUESTION).await
    }

    async fn generate(
        &self,
        user_id: &str,
        profile: &Map<String, Value>,
        params: &Map<String, Value>,
    ) -> Result<(WorkoutTemplate, WorkoutRequirements)> {
        let requirements = WorkoutRequirements::from_params(params)?;

        let mut profile = profile.clone();
        profile.insert("user_id".into(), json!(user_id));
        profile.insert("preferred_workout_duration".into(), json!(requirements.duration));
        profile.insert("available_equipment".into(), json!(requirements.equipment));
        profile.insert("intensity".into(), json!(requirements.intensity));
        if let Some(kind) = &requirements.workout_type {
            profile.insert("fitness_goals".into(), json!([kind]));
        }
        if !requirements.target_muscles.is_empty() {
            profile.insert("target_muscles".into(), json!(requirements.target_muscles));
        }

        let template = self.generator.generate(&profile, &requirements).await?;
        Ok((template, requirements))
    }

    /// Numbered exercise list plus follow-up options.
    async fn summary(&self, template: &WorkoutTemplate, requirements: &WorkoutRequirements) -> String {
        let duration = template.duration.unwrap_or(requirements.duration);
        let kind = requirements.workout_type.as_deref().unwrap_or("");
        let mut lines = vec![
            format!("Here's your {} minute {} workout:", duration, kind).replace("  ", " "),
            String::new(),
            format!("Difficulty: {}", template.difficulty),
            String::new(),
            "Exercises:".to_string(),
        ];

        for (i, slot) in template.exercises.iter().enumerate() {
            let name = match self.exercises.get(&slot.exercise_id).await {
                Ok(Some(exercise)) => exercise.name,
                Ok(None) => slot.exercise_id.clone(),
                Err(e) => {
                    warn!("WorkoutPlanner: could not load exercise {}: {}", slot.exercise_id, e);
                    slot.exercise_id.clone()
                }
            };
            lines.push(format!(
                "{}. {}: {} sets × {} reps (Rest: {}s)",
                i + 1,
                name,
                slot.sets,
                slot.reps,
                slot.rest_time
            ));
        }

        lines.extend(
            [
                "",
                "Would you like to:",
                "1. Start this workout",
                "2. See detailed instructions for any exercise",
                "3. Modify the workout",
                "4. Save it as a template",
            ]
            .map(String::from),
        );
        lines.join("\n")
    }
}

fn extract_from_message(params: &mut Map<String, Value>, message: &str) {
    slots::fill_missing(params, "duration", slots::find_duration(message).map(|d| json!(d)));
    slots::fill_missing(
        params,
        "type",
        slots::find_keyword(message, slots::WORKOUT_TYPES).map(|t| json!(t)),
    );
    slots::fill_missing(
        params,
        "intensity",
        slots::find_keyword(message, slots::INTENSITIES).map(|t| json!(t)),
    );
    let muscles = slots::find_keywords(message, slots::MUSCLE_GROUPS);
    slots::fill_missing(
        params,
        "target_muscles",
        (!muscles.is_empty()).then(|| json!(muscles)),
    );
}
