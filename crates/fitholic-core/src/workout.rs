//! Workout domain records — exercises, templates, and workout logs.
//!
//! These serialize to the JSON blobs the stores persist, so field names and
//! nesting are part of the storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FitholicError, Result};

/// A catalogued exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub exercise_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub exercise_type: Option<String>,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl Exercise {
    pub fn new(name: &str) -> Self {
        Self {
            exercise_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            exercise_type: None,
            muscle_groups: Vec::new(),
            equipment: Vec::new(),
            difficulty: None,
            instructions: None,
        }
    }
}

/// One exercise slot in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExercise {
    pub exercise_id: String,
    pub sets: u32,
    pub reps: u32,
    /// Rest between sets in seconds.
    pub rest_time: u32,
}

/// A reusable workout plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub template_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub difficulty: String,
    /// Planned duration in minutes.
    #[serde(default)]
    pub duration: Option<u32>,
    pub exercises: Vec<TemplateExercise>,
}

impl WorkoutTemplate {
    pub fn exercise(&self, exercise_id: &str) -> Option<&TemplateExercise> {
        self.exercises.iter().find(|e| e.exercise_id == exercise_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutStatus {
    Scheduled,
    Ongoing,
    Completed,
}

impl WorkoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    /// Only scheduled → ongoing → completed is allowed.
    pub fn can_move_to(&self, next: WorkoutStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Ongoing) | (Self::Ongoing, Self::Completed)
        )
    }
}

impl std::fmt::Display for WorkoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSet {
    pub weight: f64,
    pub reps: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogExercise {
    pub exercise_id: String,
    #[serde(default)]
    pub sets: Vec<LogSet>,
    #[serde(default)]
    pub completed: bool,
}

impl LogExercise {
    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }

    pub fn progress(&self) -> SetProgress {
        let total = self.sets.len();
        let completed = self.completed_sets();
        SetProgress {
            completed_sets: completed,
            total_sets: total,
            remaining_sets: total - completed,
        }
    }
}

/// Completed versus planned sets for one exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetProgress {
    pub completed_sets: usize,
    pub total_sets: usize,
    pub remaining_sets: usize,
}

/// Direction of a voice navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavAction {
    Next,
    Previous,
    Skip,
}

impl NavAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "next" => Some(Self::Next),
            "previous" | "prev" | "back" => Some(Self::Previous),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// A user's workout, planned or performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLog {
    pub log_id: String,
    pub user_id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    pub date: DateTime<Utc>,
    pub status: WorkoutStatus,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Elapsed minutes, set on completion.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<LogExercise>,
}

impl WorkoutLog {
    /// An empty scheduled log.
    pub fn scheduled(user_id: &str) -> Self {
        Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            template_id: None,
            date: Utc::now(),
            status: WorkoutStatus::Scheduled,
            start_time: None,
            end_time: None,
            duration: None,
            notes: None,
            exercises: Vec::new(),
        }
    }

    /// A scheduled log with one pending set per planned template set.
    pub fn from_template(user_id: &str, template: &WorkoutTemplate) -> Self {
        let mut log = Self::scheduled(user_id);
        log.template_id = Some(template.template_id.clone());
        log.exercises = template
            .exercises
            .iter()
            .map(|e| LogExercise {
                exercise_id: e.exercise_id.clone(),
                sets: (0..e.sets)
                    .map(|_| LogSet {
                        weight: 0.0,
                        reps: e.reps,
                        completed: false,
                    })
                    .collect(),
                completed: false,
            })
            .collect();
        log
    }

    fn transition(&mut self, next: WorkoutStatus) -> Result<()> {
        if !self.status.can_move_to(next) {
            return Err(FitholicError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// scheduled → ongoing.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(WorkoutStatus::Ongoing)?;
        self.start_time = Some(at);
        Ok(())
    }

    /// ongoing → completed. Rejected while any exercise is still incomplete.
    pub fn complete(&mut self, end_time: DateTime<Utc>, notes: Option<String>) -> Result<()> {
        if !self.status.can_move_to(WorkoutStatus::Completed) {
            return Err(FitholicError::InvalidTransition {
                from: self.status.to_string(),
                to: WorkoutStatus::Completed.to_string(),
            });
        }
        let remaining = self.exercises.iter().filter(|e| !e.completed).count();
        if remaining > 0 {
            return Err(FitholicError::Validation(format!(
                "{} exercise(s) are not completed yet",
                remaining
            )));
        }

        self.transition(WorkoutStatus::Completed)?;
        self.end_time = Some(end_time);
        self.duration = self
            .start_time
            .map(|start| (end_time - start).num_minutes().max(0));
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }

    /// Index of the first exercise not yet completed.
    pub fn current_index(&self) -> Option<usize> {
        self.exercises.iter().position(|e| !e.completed)
    }

    pub fn current_exercise(&self) -> Option<&LogExercise> {
        self.current_index().map(|i| &self.exercises[i])
    }

    /// Record a set against the current exercise.
    ///
    /// Fills the next pending set, or appends one when none are pending. The
    /// exercise is marked completed once its last pending set is filled.
    pub fn log_set(&mut self, reps: u32, weight: f64) -> Result<&LogExercise> {
        let idx = self
            .current_index()
            .ok_or_else(|| FitholicError::Validation("All exercises are already completed".into()))?;
        let exercise = &mut self.exercises[idx];

        match exercise.sets.iter_mut().find(|s| !s.completed) {
            Some(pending) => {
                pending.reps = reps;
                pending.weight = weight;
                pending.completed = true;
                if exercise.sets.iter().all(|s| s.completed) {
                    exercise.completed = true;
                }
            }
            None => exercise.sets.push(LogSet {
                weight,
                reps,
                completed: true,
            }),
        }
        Ok(&self.exercises[idx])
    }

    /// Move the exercise pointer. Returns the new current index.
    ///
    /// `next` completes the current exercise only when another one follows;
    /// `skip` always completes it; `previous` reopens the exercise before the
    /// current one.
    pub fn navigate(&mut self, action: NavAction) -> Result<Option<usize>> {
        let current = self.current_index();
        match action {
            NavAction::Next => {
                let idx = current.ok_or_else(|| {
                    FitholicError::Validation("All exercises are already completed".into())
                })?;
                if idx + 1 >= self.exercises.len() {
                    return Err(FitholicError::Validation(
                        "This is the last exercise. Say 'skip' or finish the workout.".into(),
                    ));
                }
                self.exercises[idx].completed = true;
            }
            NavAction::Skip => {
                let idx = current.ok_or_else(|| {
                    FitholicError::Validation("All exercises are already completed".into())
                })?;
                self.exercises[idx].completed = true;
            }
            NavAction::Previous => {
                let idx = current.unwrap_or(self.exercises.len());
                if idx == 0 {
                    return Err(FitholicError::Validation(
                        "Already at the first exercise".into(),
                    ));
                }
                self.exercises[idx - 1].completed = false;
            }
        }
        Ok(self.current_index())
    }

    /// Sum of weight × reps over completed sets.
    pub fn total_volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter(|s| s.completed)
            .map(|s| s.weight * s.reps as f64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(sets: &[u32]) -> WorkoutTemplate {
        WorkoutTemplate {
            template_id: "t1".into(),
            user_id: None,
            name: "Push".into(),
            description: None,
            difficulty: "intermediate".into(),
            duration: Some(45),
            exercises: sets
                .iter()
                .enumerate()
                .map(|(i, s)| TemplateExercise {
                    exercise_id: format!("ex{}", i),
                    sets: *s,
                    reps: 10,
                    rest_time: 60,
                })
                .collect(),
        }
    }

    #[test]
    fn status_only_moves_forward() {
        let mut log = WorkoutLog::scheduled("u1");
        assert!(log.complete(Utc::now(), None).is_err());
        log.start(Utc::now()).unwrap();
        assert!(log.start(Utc::now()).is_err());
        log.complete(Utc::now(), Some("good".into())).unwrap();
        assert_eq!(log.status, WorkoutStatus::Completed);
        assert!(log.end_time.is_some());
        assert!(log.start(Utc::now()).is_err());
    }

    #[test]
    fn completion_requires_every_exercise_completed() {
        let mut log = WorkoutLog::from_template("u1", &template(&[1, 1]));
        log.start(Utc::now()).unwrap();
        log.log_set(10, 50.0).unwrap();

        let err = log.complete(Utc::now(), None).unwrap_err();
        assert!(matches!(err, FitholicError::Validation(_)));
        assert_eq!(log.status, WorkoutStatus::Ongoing);
        assert!(log.end_time.is_none());

        log.log_set(8, 20.0).unwrap();
        log.complete(Utc::now(), None).unwrap();
        assert_eq!(log.status, WorkoutStatus::Completed);
    }

    #[test]
    fn log_set_fills_pending_sets_then_completes() {
        let mut log = WorkoutLog::from_template("u1", &template(&[2, 3]));
        log.log_set(10, 60.0).unwrap();
        assert_eq!(log.current_index(), Some(0));
        let ex = log.log_set(9, 60.0).unwrap();
        assert!(ex.completed);
        assert_eq!(log.current_index(), Some(1));
        assert_eq!(log.total_volume(), 10.0 * 60.0 + 9.0 * 60.0);
    }

    #[test]
    fn progress_counts_completed_sets() {
        let mut log = WorkoutLog::from_template("u1", &template(&[4]));
        log.log_set(10, 40.0).unwrap();
        log.log_set(10, 40.0).unwrap();
        let progress = log.current_exercise().unwrap().progress();
        assert_eq!(
            progress,
            SetProgress {
                completed_sets: 2,
                total_sets: 4,
                remaining_sets: 2
            }
        );
    }

    #[test]
    fn navigation_moves_pointer() {
        let mut log = WorkoutLog::from_template("u1", &template(&[3, 3, 3]));
        assert_eq!(log.navigate(NavAction::Next).unwrap(), Some(1));
        assert_eq!(log.navigate(NavAction::Previous).unwrap(), Some(0));
        assert!(log.navigate(NavAction::Previous).is_err());

        log.navigate(NavAction::Skip).unwrap();
        log.navigate(NavAction::Next).unwrap();
        assert_eq!(log.current_index(), Some(2));
        assert!(log.navigate(NavAction::Next).is_err());
        assert_eq!(log.navigate(NavAction::Skip).unwrap(), None);
        assert_eq!(log.navigate(NavAction::Previous).unwrap(), Some(2));
    }
}
