//! LLM-backed workout generator.
//!
//! Plans a workout, then resolves every planned exercise against the catalogue,
//! generating the ones it has not seen before.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::generator::{
    ExerciseGenerator, ExerciseRequirements, WorkoutGenerator, WorkoutRequirements, list_param,
    string_param,
};
use fitholic_core::llm::LlmClient;
use fitholic_core::provider::ChatRequest;
use fitholic_core::store::{ExerciseStore, WorkoutTemplateStore};
use fitholic_core::workout::{TemplateExercise, WorkoutTemplate};

const SYSTEM_PROMPT: &str = "You are an expert fitness trainer specialized in creating personalized workout plans. \
Consider the user's goals, fitness level, and preferences when generating workouts.

Important: For each exercise, provide a clear, standard exercise name that would be found \
in a typical exercise database (e.g., \"Push-ups\", \"Dumbbell Squats\", \"Plank\"). \
Also provide the primary muscle groups targeted by each exercise.

The workout plan should include:
1. 2-3 Warm-up exercises (low intensity, 1-2 sets)
2. 4-6 Main workout exercises with sets and reps
3. 2-3 Cool-down/stretching exercises (low intensity, 1 set)
4. Rest periods between exercises (in seconds)

Make sure exercises match the available equipment and fitness level. \
Include a mix of exercises targeting different muscle groups. \
For each exercise, specify the target muscle groups and required equipment.";

#[derive(Debug, Deserialize)]
struct PlannedExercise {
    name: String,
    sets: u32,
    reps: u32,
    rest_time: u32,
    #[serde(default)]
    target_muscles: Vec<String>,
    #[serde(default)]
    equipment_needed: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WorkoutPlan {
    name: String,
    #[serde(default)]
    description: Option<String>,
    difficulty: String,
    exercises: Vec<PlannedExercise>,
}

/// Generates a workout template and saves it so a voice session can start from it.
pub struct LlmWorkoutGenerator {
    llm: LlmClient,
    exercise_generator: Arc<dyn ExerciseGenerator>,
    exercises: Arc<dyn ExerciseStore>,
    templates: Arc<dyn WorkoutTemplateStore>,
}

impl LlmWorkoutGenerator {
    pub fn new(
        llm: LlmClient,
        exercise_generator: Arc<dyn ExerciseGenerator>,
        exercises: Arc<dyn ExerciseStore>,
        templates: Arc<dyn WorkoutTemplateStore>,
    ) -> Self {
        Self {
            llm,
            exercise_generator,
            exercises,
            templates,
        }
    }

    fn request(profile: &Map<String, Value>, requirements: &WorkoutRequirements) -> ChatRequest {
        let goals = list_param(profile, "fitness_goals");
        let equipment = if requirements.equipment.is_empty() {
            list_param(profile, "available_equipment")
        } else {
            requirements.equipment.clone()
        };
        let mut user = format!(
            "Based on the following user profile and preferences:\n\
             Goals: {}\n\
             Fitness Level: {}\n\
             Available Equipment: {}\n\
             Time Available: {} minutes\n\
             Intensity: {}\n",
            if goals.is_empty() { "general fitness".to_string() } else { goals.join(", ") },
            string_param(profile, "fitness_level").unwrap_or_else(|| "beginner".into()),
            if equipment.is_empty() { "none".to_string() } else { equipment.join(", ") },
            requirements.duration,
            requirements.intensity,
        );
        if let Some(kind) = &requirements.workout_type {
            user.push_str(&format!("Workout Type: {}\n", kind));
        }
        if !requirements.target_muscles.is_empty() {
            user.push_str(&format!("Target Muscles: {}\n", requirements.target_muscles.join(", ")));
        }
        user.push_str("\nGenerate a workout plan that matches the user's profile.");

        ChatRequest::prompt(SYSTEM_PROMPT, &user).with_schema(
            "workout_plan",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "difficulty": { "type": "string", "enum": ["beginner", "intermediate", "advanced"] },
                    "exercises": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "sets": { "type": "integer" },
                                "reps": { "type": "integer" },
                                "rest_time": { "type": "integer" },
                                "target_muscles": { "type": "array", "items": { "type": "string" } },
                                "equipment_needed": { "type": "array", "items": { "type": "string" } }
                            },
                            "required": ["name", "sets", "reps", "rest_time", "target_muscles", "equipment_needed"]
                        }
                    }
                },
                "required": ["name", "description", "difficulty", "exercises"]
            }),
        )
    }

    /// Catalogue id for a planned exercise, generating it when unknown.
    async fn resolve_exercise(
        &self,
        planned: &PlannedExercise,
        difficulty: &str,
        fallback_equipment: &[String],
    ) -> Result<String> {
        if let Some(existing) = self.exercises.find_by_name(&planned.name).await? {
            return Ok(existing.exercise_id);
        }

        info!("Generating new exercise: {}", planned.name);
        let requirements = ExerciseRequirements {
            exercise_type: planned.name.clone(),
            target_muscles: planned.target_muscles.clone(),
            equipment: if planned.equipment_needed.is_empty() {
                fallback_equipment.to_vec()
            } else {
                planned.equipment_needed.clone()
            },
            difficulty: difficulty.to_string(),
            considerations: None,
        };
        let exercise = self.exercise_generator.generate(&requirements).await?;
        Ok(exercise.exercise_id)
    }
}

#[async_trait]
impl WorkoutGenerator for LlmWorkoutGenerator {
    async fn generate(
        &self,
        profile: &Map<String, Value>,
        requirements: &WorkoutRequirements,
    ) -> Result<WorkoutTemplate> {
        let plan: WorkoutPlan = self
            .llm
            .complete_json(Self::request(profile, requirements))
            .await
            .map_err(|e| FitholicError::Generation(format!("Workout generation failed: {}", e)))?;

        let fallback_equipment = list_param(profile, "available_equipment");
        let mut exercises = Vec::new();
        for planned in &plan.exercises {
            match self
                .resolve_exercise(planned, &plan.difficulty, &fallback_equipment)
                .await
            {
                Ok(exercise_id) => exercises.push(TemplateExercise {
                    exercise_id,
                    sets: planned.sets,
                    reps: planned.reps,
                    rest_time: planned.rest_time,
                }),
                Err(e) => warn!("Skipping exercise {}: {}", planned.name, e),
            }
        }

        if exercises.is_empty() {
            return Err(FitholicError::Generation(
                "No valid exercises could be created from the generated workout".into(),
            ));
        }

        let template = WorkoutTemplate {
            template_id: uuid::Uuid::new_v4().to_string(),
            user_id: string_param(profile, "user_id"),
            name: plan.name,
            description: plan.description,
            difficulty: plan.difficulty,
            duration: Some(requirements.duration),
            exercises,
        };
        self.templates.create(&template).await?;
        info!(
            "Generated workout template {} with {} exercises",
            template.template_id,
            template.exercises.len()
        );
        Ok(template)
    }
}
