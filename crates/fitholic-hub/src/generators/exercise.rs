//! LLM-backed exercise generator.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::generator::{ExerciseGenerator, ExerciseRequirements};
use fitholic_core::llm::LlmClient;
use fitholic_core::provider::ChatRequest;
use fitholic_core::store::ExerciseStore;
use fitholic_core::workout::Exercise;

const SYSTEM_PROMPT: &str = "You are an expert fitness trainer specialized in creating detailed exercise descriptions. \
     Focus on proper form, safety, and effectiveness when describing exercises.";

#[derive(Debug, Deserialize)]
struct ExerciseDetails {
    name: String,
    description: String,
    muscle_groups: Vec<String>,
    #[serde(default)]
    equipment: Vec<String>,
    difficulty: String,
    instructions: String,
}

/// Generates an exercise and saves it to the catalogue.
pub struct LlmExerciseGenerator {
    llm: LlmClient,
    exercises: Arc<dyn ExerciseStore>,
}

impl LlmExerciseGenerator {
    pub fn new(llm: LlmClient, exercises: Arc<dyn ExerciseStore>) -> Self {
        Self { llm, exercises }
    }

    fn request(requirements: &ExerciseRequirements) -> ChatRequest {
        let none_if_empty = |items: &[String]| {
            if items.is_empty() {
                "None".to_string()
            } else {
                items.join(", ")
            }
        };
        let user = format!(
            "Generate a detailed exercise description with the following parameters:\n\
             Exercise Type: {}\n\
             Target Muscles: {}\n\
             Available Equipment: {}\n\
             Difficulty Level: {}\n\
             Special Considerations: {}\n\n\
             Provide a complete exercise description that includes all necessary details for proper execution.",
            requirements.exercise_type,
            requirements.target_muscles.join(", "),
            none_if_empty(&requirements.equipment),
            requirements.difficulty,
            requirements.considerations.as_deref().unwrap_or("None"),
        );
        ChatRequest::prompt(SYSTEM_PROMPT, &user).with_schema(
            "exercise_details",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "muscle_groups": { "type": "array", "items": { "type": "string" } },
                    "equipment": { "type": "array", "items": { "type": "string" } },
                    "difficulty": { "type": "string", "enum": ["beginner", "intermediate", "advanced"] },
                    "instructions": { "type": "string" }
                },
                "required": ["name", "description", "muscle_groups", "equipment", "difficulty", "instructions"]
            }),
        )
    }
}

#[async_trait]
impl ExerciseGenerator for LlmExerciseGenerator {
    async fn generate(&self, requirements: &ExerciseRequirements) -> Result<Exercise> {
        let details: ExerciseDetails = self
            .llm
            .complete_json(Self::request(requirements))
            .await
            .map_err(|e| FitholicError::Generation(format!("Failed to generate exercise: {}", e)))?;

        let mut exercise = Exercise::new(details.name.trim());
        exercise.description = Some(details.description);
        exercise.exercise_type = Some(requirements.exercise_type.clone());
        exercise.muscle_groups = details.muscle_groups;
        exercise.equipment = details.equipment;
        exercise.difficulty = Some(details.difficulty);
        exercise.instructions = Some(details.instructions);

        self.exercises.create(&exercise).await?;
        info!("Generated exercise {} ({})", exercise.name, exercise.exercise_id);
        Ok(exercise)
    }
}
