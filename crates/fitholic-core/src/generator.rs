//! Generation services — the collaborators slot-filling hands off to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dialogue::slots;
use crate::error::{FitholicError, Result};
use crate::workout::{Exercise, WorkoutTemplate};

pub const MIN_WORKOUT_MINUTES: u32 = 15;
pub const MAX_WORKOUT_MINUTES: u32 = 120;

/// Validated input for exercise generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRequirements {
    pub exercise_type: String,
    pub target_muscles: Vec<String>,
    pub equipment: Vec<String>,
    pub difficulty: String,
    pub considerations: Option<String>,
}

impl ExerciseRequirements {
    /// Normalize loosely-typed intent parameters.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self> {
        let exercise_type = string_param(params, "exercise_type").ok_or_else(|| {
            FitholicError::Validation("Invalid exercise requirements: exercise_type is required".into())
        })?;
        let target_muscles = list_param(params, "target_muscles");
        if target_muscles.is_empty() {
            return Err(FitholicError::Validation(
                "Invalid exercise requirements: target_muscles is required".into(),
            ));
        }

        Ok(Self {
            exercise_type,
            target_muscles,
            equipment: list_param(params, "equipment"),
            difficulty: string_param(params, "difficulty").unwrap_or_else(|| "intermediate".into()),
            considerations: string_param(params, "considerations"),
        })
    }
}

/// Validated input for workout generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRequirements {
    /// Minutes, within 15–120.
    pub duration: u32,
    pub workout_type: Option<String>,
    pub target_muscles: Vec<String>,
    pub equipment: Vec<String>,
    pub intensity: String,
}

impl WorkoutRequirements {
    pub fn from_params(params: &Map<String, Value>) -> Result<Self> {
        let duration = duration_param(params).ok_or_else(|| {
            FitholicError::Validation("Invalid workout requirements: duration is required".into())
        })?;
        if !(MIN_WORKOUT_MINUTES..=MAX_WORKOUT_MINUTES).contains(&duration) {
            return Err(FitholicError::Validation(format!(
                "Invalid workout requirements: duration must be between {} and {} minutes, got {}",
                MIN_WORKOUT_MINUTES, MAX_WORKOUT_MINUTES, duration
            )));
        }

        Ok(Self {
            duration,
            workout_type: string_param(params, "type")
                .or_else(|| string_param(params, "workout_type")),
            target_muscles: list_param(params, "target_muscles"),
            equipment: list_param(params, "equipment"),
            intensity: string_param(params, "intensity").unwrap_or_else(|| "moderate".into()),
        })
    }
}

/// A non-empty string parameter.
pub fn string_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A list parameter; a bare string becomes a single-element list.
pub fn list_param(params: &Map<String, Value>, key: &str) -> Vec<String> {
    match params.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Duration in minutes from a number or a string like "45", "45-minute" or "1 hour".
pub fn duration_param(params: &Map<String, Value>) -> Option<u32> {
    match params.get("duration")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => slots::find_duration(s).or_else(|| {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        }),
        _ => None,
    }
}

#[async_trait]
pub trait ExerciseGenerator: Send + Sync {
    async fn generate(&self, requirements: &ExerciseRequirements) -> Result<Exercise>;
}

#[async_trait]
pub trait WorkoutGenerator: Send + Sync {
    async fn generate(
        &self,
        profile: &Map<String, Value>,
        requirements: &WorkoutRequirements,
    ) -> Result<WorkoutTemplate>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn exercise_requirements_coerce_strings_and_default() {
        let req = ExerciseRequirements::from_params(&params(json!({
            "exercise_type": "strength",
            "target_muscles": "chest",
            "equipment": "dumbbells"
        })))
        .unwrap();
        assert_eq!(req.target_muscles, vec!["chest"]);
        assert_eq!(req.equipment, vec!["dumbbells"]);
        assert_eq!(req.difficulty, "intermediate");
        assert!(req.considerations.is_none());
    }

    #[test]
    fn exercise_requirements_reject_missing_fields() {
        let err = ExerciseRequirements::from_params(&params(json!({ "exercise_type": "cardio" })))
            .unwrap_err();
        assert!(err.to_string().contains("target_muscles"));
    }

    #[test]
    fn workout_duration_is_parsed_and_bounded() {
        let ok = WorkoutRequirements::from_params(&params(json!({ "duration": "45 minutes" }))).unwrap();
        assert_eq!(ok.duration, 45);
        assert_eq!(ok.intensity, "moderate");

        let hour = WorkoutRequirements::from_params(&params(json!({ "duration": "1 hour" }))).unwrap();
        assert_eq!(hour.duration, 60);
        let hyphen = WorkoutRequirements::from_params(&params(json!({ "duration": "45-minute" }))).unwrap();
        assert_eq!(hyphen.duration, 45);
        let bare = WorkoutRequirements::from_params(&params(json!({ "duration": "30" }))).unwrap();
        assert_eq!(bare.duration, 30);

        assert!(WorkoutRequirements::from_params(&params(json!({ "duration": 5 }))).is_err());
        assert!(WorkoutRequirements::from_params(&params(json!({ "duration": 300 }))).is_err());
        assert!(WorkoutRequirements::from_params(&params(json!({}))).is_err());
    }
}
