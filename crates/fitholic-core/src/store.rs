//! Repository traits for workout records, with an in-memory backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{FitholicError, Result};
use crate::memory::lock;
use crate::workout::{Exercise, WorkoutLog, WorkoutStatus, WorkoutTemplate};

#[async_trait]
pub trait WorkoutLogStore: Send + Sync {
    async fn get(&self, log_id: &str) -> Result<Option<WorkoutLog>>;

    /// The user's single log in `ongoing` status, if any.
    async fn get_ongoing(&self, user_id: &str) -> Result<Option<WorkoutLog>>;

    async fn create(&self, log: &WorkoutLog) -> Result<()>;

    /// Whole-record overwrite. Last write wins.
    async fn update(&self, log: &WorkoutLog) -> Result<()>;
}

#[async_trait]
pub trait WorkoutTemplateStore: Send + Sync {
    async fn get(&self, template_id: &str) -> Result<Option<WorkoutTemplate>>;

    async fn create(&self, template: &WorkoutTemplate) -> Result<()>;
}

#[async_trait]
pub trait ExerciseStore: Send + Sync {
    async fn get(&self, exercise_id: &str) -> Result<Option<Exercise>>;

    /// Case-insensitive lookup by exercise name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Exercise>>;

    async fn create(&self, exercise: &Exercise) -> Result<()>;
}

/// In-memory backend for all three repositories.
#[derive(Default)]
pub struct InMemoryWorkoutStore {
    logs: Mutex<HashMap<String, WorkoutLog>>,
    templates: Mutex<HashMap<String, WorkoutTemplate>>,
    exercises: Mutex<HashMap<String, Exercise>>,
}

impl InMemoryWorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkoutLogStore for InMemoryWorkoutStore {
    async fn get(&self, log_id: &str) -> Result<Option<WorkoutLog>> {
        Ok(lock(&self.logs)?.get(log_id).cloned())
    }

    async fn get_ongoing(&self, user_id: &str) -> Result<Option<WorkoutLog>> {
        let logs = lock(&self.logs)?;
        Ok(logs
            .values()
            .filter(|l| l.user_id == user_id && l.status == WorkoutStatus::Ongoing)
            .max_by_key(|l| l.date)
            .cloned())
    }

    async fn create(&self, log: &WorkoutLog) -> Result<()> {
        lock(&self.logs)?.insert(log.log_id.clone(), log.clone());
        Ok(())
    }

    async fn update(&self, log: &WorkoutLog) -> Result<()> {
        let mut logs = lock(&self.logs)?;
        match logs.get_mut(&log.log_id) {
            Some(existing) => {
                *existing = log.clone();
                Ok(())
            }
            None => Err(FitholicError::NotFound(format!("Workout log {}", log.log_id))),
        }
    }
}

#[async_trait]
impl WorkoutTemplateStore for InMemoryWorkoutStore {
    async fn get(&self, template_id: &str) -> Result<Option<WorkoutTemplate>> {
        Ok(lock(&self.templates)?.get(template_id).cloned())
    }

    async fn create(&self, template: &WorkoutTemplate) -> Result<()> {
        lock(&self.templates)?.insert(template.template_id.clone(), template.clone());
        Ok(())
    }
}

#[async_trait]
impl ExerciseStore for InMemoryWorkoutStore {
    async fn get(&self, exercise_id: &str) -> Result<Option<Exercise>> {
        Ok(lock(&self.exercises)?.get(exercise_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Exercise>> {
        let exercises = lock(&self.exercises)?;
        Ok(exercises
            .values()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    async fn create(&self, exercise: &Exercise) -> Result<()> {
        lock(&self.exercises)?.insert(exercise.exercise_id.clone(), exercise.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ongoing_lookup_ignores_other_statuses() {
        let store = InMemoryWorkoutStore::new();
        let scheduled = WorkoutLog::scheduled("u1");
        WorkoutLogStore::create(&store, &scheduled).await.unwrap();
        assert!(store.get_ongoing("u1").await.unwrap().is_none());

        let mut ongoing = WorkoutLog::scheduled("u1");
        ongoing.start(chrono::Utc::now()).unwrap();
        WorkoutLogStore::create(&store, &ongoing).await.unwrap();

        let found = store.get_ongoing("u1").await.unwrap().unwrap();
        assert_eq!(found.log_id, ongoing.log_id);
        assert!(store.get_ongoing("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_requires_existing_log() {
        let store = InMemoryWorkoutStore::new();
        let log = WorkoutLog::scheduled("u1");
        assert!(WorkoutLogStore::update(&store, &log).await.is_err());
    }

    #[tokio::test]
    async fn exercises_are_found_by_name_case_insensitively() {
        let store = InMemoryWorkoutStore::new();
        ExerciseStore::create(&store, &Exercise::new("Push-Up")).await.unwrap();
        assert!(store.find_by_name("push-up ").await.unwrap().is_some());
        assert!(store.find_by_name("squat").await.unwrap().is_none());
    }
}
