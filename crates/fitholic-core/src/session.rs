//! In-memory workout session manager.
//!
//! Superseded by the ongoing [`WorkoutLog`](crate::workout::WorkoutLog) kept in
//! the workout store; the voice endpoints no longer read from here. Kept for
//! callers that track a workout without persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{FitholicError, Result};
use crate::memory::lock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub weight: f64,
    pub reps: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub exercise_id: String,
    pub sets_completed: Vec<WorkoutSet>,
    pub target_sets: u32,
    pub target_reps: u32,
    pub rest_duration: u32,
}

impl ExerciseProgress {
    fn volume(&self) -> f64 {
        self.sets_completed.iter().map(|s| s.weight * s.reps as f64).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub session_id: String,
    pub user_id: String,
    pub template_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub current_exercise_index: usize,
    /// Insertion-ordered; `current_exercise_index` points into this list.
    pub exercises: Vec<ExerciseProgress>,
    #[serde(default)]
    pub notes: String,
}

impl WorkoutSession {
    fn exercise_mut(&mut self, exercise_id: &str) -> Result<&mut ExerciseProgress> {
        self.exercises
            .iter_mut()
            .find(|e| e.exercise_id == exercise_id)
            .ok_or_else(|| FitholicError::NotFound(format!("Exercise {} in session", exercise_id)))
    }

    /// `{}` when the session has no exercises yet.
    pub fn current_state(&self) -> Value {
        match self.exercises.get(self.current_exercise_index) {
            Some(e) => json!({
                "exercise_id": e.exercise_id,
                "sets_completed": e.sets_completed.len(),
                "target_sets": e.target_sets,
                "target_reps": e.target_reps,
                "rest_duration": e.rest_duration,
            }),
            None => json!({}),
        }
    }

    pub fn summary(&self, now: DateTime<Utc>) -> Value {
        let mut exercises = Map::new();
        let mut total_sets = 0;
        let mut total_volume = 0.0;
        for e in &self.exercises {
            let volume = e.volume();
            exercises.insert(
                e.exercise_id.clone(),
                json!({
                    "sets_completed": e.sets_completed.len(),
                    "total_reps": e.sets_completed.iter().map(|s| s.reps).sum::<u32>(),
                    "total_volume": volume,
                }),
            );
            total_sets += e.sets_completed.len();
            total_volume += volume;
        }
        let duration_minutes = (now - self.start_time).num_seconds() as f64 / 60.0;
        json!({
            "session_id": self.session_id,
            "duration_minutes": duration_minutes,
            "total_sets": total_sets,
            "total_volume": total_volume,
            "exercises": exercises,
        })
    }
}

/// Active sessions keyed by session id, at most one per user.
#[deprecated(note = "use the ongoing WorkoutLog in the workout store")]
#[derive(Default)]
pub struct WorkoutSessionManager {
    sessions: Mutex<HashMap<String, WorkoutSession>>,
}

#[allow(deprecated)]
impl WorkoutSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, user_id: &str, template_id: Option<&str>) -> Result<WorkoutSession> {
        let mut sessions = lock(&self.sessions)?;
        if let Some(existing) = sessions.values().find(|s| s.user_id == user_id) {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let session = WorkoutSession {
            session_id: format!("ws_{}_{}", now.format("%Y%m%d%H%M%S"), user_id),
            user_id: user_id.to_string(),
            template_id: template_id.map(str::to_string),
            start_time: now,
            current_exercise_index: 0,
            exercises: Vec::new(),
            notes: String::new(),
        };
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Result<Option<WorkoutSession>> {
        Ok(lock(&self.sessions)?.get(session_id).cloned())
    }

    /// Append an exercise; re-adding an existing id resets its targets only.
    pub fn add_exercise(
        &self,
        session_id: &str,
        exercise_id: &str,
        target_sets: u32,
        target_reps: u32,
        rest_duration: u32,
    ) -> Result<()> {
        self.with_session(session_id, |session| {
            if let Ok(existing) = session.exercise_mut(exercise_id) {
                existing.target_sets = target_sets;
                existing.target_reps = target_reps;
                existing.rest_duration = rest_duration;
            } else {
                session.exercises.push(ExerciseProgress {
                    exercise_id: exercise_id.to_string(),
                    sets_completed: Vec::new(),
                    target_sets,
                    target_reps,
                    rest_duration,
                });
            }
            Ok(())
        })
    }

    pub fn log_set(&self, session_id: &str, exercise_id: &str, weight: f64, reps: u32) -> Result<()> {
        self.with_session(session_id, |session| {
            session.exercise_mut(exercise_id)?.sets_completed.push(WorkoutSet {
                weight,
                reps,
                completed_at: Utc::now(),
            });
            Ok(())
        })
    }

    /// Advance, staying on the last exercise.
    pub fn next_exercise(&self, session_id: &str) -> Result<Value> {
        self.with_session(session_id, |session| {
            if session.current_exercise_index + 1 < session.exercises.len() {
                session.current_exercise_index += 1;
            }
            Ok(session.current_state())
        })
    }

    /// Step back, staying on the first exercise.
    pub fn previous_exercise(&self, session_id: &str) -> Result<Value> {
        self.with_session(session_id, |session| {
            session.current_exercise_index = session.current_exercise_index.saturating_sub(1);
            Ok(session.current_state())
        })
    }

    pub fn current_exercise(&self, session_id: &str) -> Result<Value> {
        self.with_session(session_id, |session| Ok(session.current_state()))
    }

    /// Remove the session and return its summary.
    pub fn end_session(&self, session_id: &str) -> Result<Value> {
        let session = lock(&self.sessions)?
            .remove(session_id)
            .ok_or_else(|| not_found(session_id))?;
        Ok(session.summary(Utc::now()))
    }

    pub fn count(&self) -> Result<usize> {
        Ok(lock(&self.sessions)?.len())
    }

    fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut WorkoutSession) -> Result<T>,
    ) -> Result<T> {
        let mut sessions = lock(&self.sessions)?;
        let session = sessions.get_mut(session_id).ok_or_else(|| not_found(session_id))?;
        f(session)
    }
}

fn not_found(session_id: &str) -> FitholicError {
    FitholicError::NotFound(format!("Workout session {}", session_id))
}
