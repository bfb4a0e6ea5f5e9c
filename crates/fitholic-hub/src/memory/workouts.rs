//! Workout repositories on the SQLite store. Records are kept as JSON blobs
//! with a few indexed columns for lookups.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use serde::de::DeserializeOwned;

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::store::{ExerciseStore, WorkoutLogStore, WorkoutTemplateStore};
use fitholic_core::workout::{Exercise, WorkoutLog, WorkoutStatus, WorkoutTemplate};

use super::sqlite::{SqliteStore, db_err};

impl SqliteStore {
    fn fetch_blob<T: DeserializeOwned>(&self, sql: &str, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .conn()?
            .query_row(sql, params![key], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        Ok(match raw {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        })
    }
}

#[async_trait]
impl WorkoutLogStore for SqliteStore {
    async fn get(&self, log_id: &str) -> Result<Option<WorkoutLog>> {
        self.fetch_blob("SELECT data FROM workout_logs WHERE log_id = ?1", log_id)
    }

    async fn get_ongoing(&self, user_id: &str) -> Result<Option<WorkoutLog>> {
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT data FROM workout_logs WHERE user_id = ?1 AND status = ?2
                 ORDER BY updated_at DESC LIMIT 1",
                params![user_id, WorkoutStatus::Ongoing.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(match raw {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        })
    }

    async fn create(&self, log: &WorkoutLog) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO workout_logs (log_id, user_id, status, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    log.log_id,
                    log.user_id,
                    log.status.as_str(),
                    serde_json::to_string(log)?,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, log: &WorkoutLog) -> Result<()> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE workout_logs SET status = ?2, data = ?3, updated_at = ?4 WHERE log_id = ?1",
                params![
                    log.log_id,
                    log.status.as_str(),
                    serde_json::to_string(log)?,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(FitholicError::NotFound(format!("Workout log {}", log.log_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkoutTemplateStore for SqliteStore {
    async fn get(&self, template_id: &str) -> Result<Option<WorkoutTemplate>> {
        self.fetch_blob(
            "SELECT data FROM workout_templates WHERE template_id = ?1",
            template_id,
        )
    }

    async fn create(&self, template: &WorkoutTemplate) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO workout_templates (template_id, data) VALUES (?1, ?2)",
                params![template.template_id, serde_json::to_string(template)?],
            )
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl ExerciseStore for SqliteStore {
    async fn get(&self, exercise_id: &str) -> Result<Option<Exercise>> {
        self.fetch_blob("SELECT data FROM exercises WHERE exercise_id = ?1", exercise_id)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Exercise>> {
        self.fetch_blob(
            "SELECT data FROM exercises WHERE name = ?1 COLLATE NOCASE LIMIT 1",
            name.trim(),
        )
    }

    async fn create(&self, exercise: &Exercise) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO exercises (exercise_id, name, data) VALUES (?1, ?2, ?3)",
                params![
                    exercise.exercise_id,
                    exercise.name,
                    serde_json::to_string(exercise)?
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitholic_core::workout::{NavAction, TemplateExercise};

    fn template() -> WorkoutTemplate {
        WorkoutTemplate {
            template_id: "t1".into(),
            user_id: Some("u1".into()),
            name: "Upper".into(),
            description: None,
            difficulty: "intermediate".into(),
            duration: Some(45),
            exercises: vec![TemplateExercise {
                exercise_id: "bench".into(),
                sets: 4,
                reps: 8,
                rest_time: 90,
            }],
        }
    }

    #[tokio::test]
    async fn log_lifecycle_persists() {
        let store = SqliteStore::in_memory().unwrap();
        let mut log = WorkoutLog::from_template("u1", &template());
        WorkoutLogStore::create(&store, &log).await.unwrap();
        assert!(store.get_ongoing("u1").await.unwrap().is_none());

        log.start(Utc::now()).unwrap();
        log.log_set(8, 60.0).unwrap();
        WorkoutLogStore::update(&store, &log).await.unwrap();

        let ongoing = store.get_ongoing("u1").await.unwrap().unwrap();
        assert_eq!(ongoing.log_id, log.log_id);
        assert_eq!(ongoing.exercises[0].completed_sets(), 1);

        log.navigate(NavAction::Skip).unwrap();
        log.complete(Utc::now(), None).unwrap();
        WorkoutLogStore::update(&store, &log).await.unwrap();
        assert!(store.get_ongoing("u1").await.unwrap().is_none());
        let stored = WorkoutLogStore::get(&store, &log.log_id).await.unwrap().unwrap();
        assert_eq!(stored.status, WorkoutStatus::Completed);
    }

    #[tokio::test]
    async fn update_of_missing_log_is_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let err = WorkoutLogStore::update(&store, &WorkoutLog::scheduled("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, FitholicError::NotFound(_)));
    }

    #[tokio::test]
    async fn templates_and_exercises() {
        let store = SqliteStore::in_memory().unwrap();
        WorkoutTemplateStore::create(&store, &template()).await.unwrap();
        let loaded = WorkoutTemplateStore::get(&store, "t1").await.unwrap().unwrap();
        assert_eq!(loaded.exercises[0].sets, 4);

        let squat = Exercise::new("Back Squat");
        ExerciseStore::create(&store, &squat).await.unwrap();
        let found = store.find_by_name("back squat").await.unwrap().unwrap();
        assert_eq!(found.exercise_id, squat.exercise_id);
        assert!(store.find_by_name("deadlift").await.unwrap().is_none());
    }
}
