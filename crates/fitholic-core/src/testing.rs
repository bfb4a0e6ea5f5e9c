//! In-process fakes for unit tests: a scripted LLM and canned generators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{FitholicError, Result};
use crate::generator::{
    ExerciseGenerator, ExerciseRequirements, WorkoutGenerator, WorkoutRequirements, string_param,
};
use crate::llm::LlmClient;
use crate::message::{LlmResponse, TokenUsage};
use crate::provider::{ChatRequest, LlmProvider};
use crate::retry::RetryPolicy;
use crate::store::{ExerciseStore, InMemoryWorkoutStore};
use crate::workout::{Exercise, TemplateExercise, WorkoutTemplate};

/// Replies with queued answers in order and records every request.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<std::result::Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn client(self: &Arc<Self>) -> LlmClient {
        LlmClient::new(self.clone(), RetryPolicy::no_retry())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Concatenated message contents of request `index`.
    pub fn prompt(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));
        match reply {
            Ok(content) => Ok(LlmResponse {
                content: Some(content),
                model: "scripted-model".into(),
                usage: TokenUsage::default(),
                finish_reason: "stop".into(),
            }),
            Err(e) => Err(FitholicError::Provider(e)),
        }
    }
}

/// Records requirements and returns a canned exercise or a generation error.
pub struct FakeExerciseGenerator {
    error: Option<String>,
    seen: Mutex<Vec<ExerciseRequirements>>,
}

impl FakeExerciseGenerator {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            error: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: FitholicError) -> Arc<Self> {
        Arc::new(Self {
            error: Some(error.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn last(&self) -> Option<ExerciseRequirements> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ExerciseGenerator for FakeExerciseGenerator {
    async fn generate(&self, requirements: &ExerciseRequirements) -> Result<Exercise> {
        self.seen.lock().unwrap().push(requirements.clone());
        if let Some(e) = &self.error {
            return Err(FitholicError::Generation(e.clone()));
        }
        let mut exercise = Exercise::new(&format!(
            "{} {} press",
            requirements.target_muscles.join(" "),
            requirements.exercise_type
        ));
        exercise.muscle_groups = requirements.target_muscles.clone();
        exercise.equipment = requirements.equipment.clone();
        exercise.difficulty = Some(requirements.difficulty.clone());
        exercise.description = Some("A generated exercise".into());
        Ok(exercise)
    }
}

/// Returns a two-exercise template built from exercises it stores itself.
pub struct FakeWorkoutGenerator {
    pub store: Arc<InMemoryWorkoutStore>,
    fail: bool,
    seen: Mutex<Vec<WorkoutRequirements>>,
}

impl FakeWorkoutGenerator {
    pub fn new(store: Arc<InMemoryWorkoutStore>, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            store,
            fail,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn last(&self) -> Option<WorkoutRequirements> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl WorkoutGenerator for FakeWorkoutGenerator {
    async fn generate(
        &self,
        profile: &Map<String, Value>,
        requirements: &WorkoutRequirements,
    ) -> Result<WorkoutTemplate> {
        self.seen.lock().unwrap().push(requirements.clone());
        if self.fail {
            return Err(FitholicError::Generation("No valid exercises could be created".into()));
        }
        let mut exercises = Vec::new();
        for name in ["Push-ups", "Plank"] {
            let exercise = Exercise::new(name);
            ExerciseStore::create(self.store.as_ref(), &exercise).await?;
            exercises.push(TemplateExercise {
                exercise_id: exercise.exercise_id,
                sets: 3,
                reps: 12,
                rest_time: 60,
            });
        }
        Ok(WorkoutTemplate {
            template_id: uuid::Uuid::new_v4().to_string(),
            user_id: string_param(profile, "user_id"),
            name: "Quick Burn".into(),
            description: None,
            difficulty: "beginner".into(),
            duration: Some(requirements.duration),
            exercises,
        })
    }
}
