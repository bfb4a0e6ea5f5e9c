//! Conversation state carried through one dialogue turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::HistoryEntry;
use crate::workout::{Exercise, WorkoutTemplate};

/// Where a turn currently stands in the dialogue state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    NewMessage,
    IntentParsed,
    GatheringRequirements,
    ExerciseCreated,
    WorkoutGenerated,
    Motivated,
    Error,
}

impl ChatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::IntentParsed => "intent_parsed",
            Self::GatheringRequirements => "gathering_requirements",
            Self::ExerciseCreated => "exercise_created",
            Self::WorkoutGenerated => "workout_generated",
            Self::Motivated => "motivated",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ChatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classified purpose of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    LogWorkout,
    CreateExercise,
    GenerateWorkout,
    #[serde(other)]
    Unknown,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogWorkout => "log_workout",
            Self::CreateExercise => "create_exercise",
            Self::GenerateWorkout => "generate_workout",
            Self::Unknown => "unknown",
        }
    }
}

/// A classified intent with its extracted slot values.
///
/// `confidence` is always within `[0, 1]`: construct through [`Intent::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: IntentType,
    confidence: f64,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl Intent {
    pub fn new(kind: IntentType, confidence: f64, parameters: Map<String, Value>) -> Self {
        Self {
            kind,
            confidence: clamp_confidence(confidence),
            parameters,
        }
    }

    /// The intent every parse failure degrades to.
    pub fn unknown() -> Self {
        Self::new(IntentType::Unknown, 0.0, Map::new())
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Re-validate after deserializing from an untrusted blob.
    pub fn sanitized(self) -> Self {
        Self::new(self.kind, self.confidence, self.parameters)
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        tracing::warn!("Intent confidence was NaN, treating as 0.0");
        return 0.0;
    }
    if !(0.0..=1.0).contains(&confidence) {
        tracing::warn!("Intent confidence {} outside [0, 1], clamping", confidence);
    }
    confidence.clamp(0.0, 1.0)
}

/// Slot-filling progress persisted between turns of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDialogue {
    pub current_state: ChatState,
    pub current_intent: Intent,
}

/// Mutable record threaded through the dialogue nodes for a single turn.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub session_id: String,
    pub user_id: String,
    pub user_profile: Map<String, Value>,
    pub chat_history: Vec<HistoryEntry>,
    pub current_message: String,
    pub current_intent: Option<Intent>,
    pub current_state: ChatState,
    pub created_exercise: Option<Exercise>,
    pub generated_workout: Option<WorkoutTemplate>,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl ConversationState {
    pub fn new(
        session_id: &str,
        user_id: &str,
        message: &str,
        chat_history: Vec<HistoryEntry>,
        user_profile: Map<String, Value>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            user_profile,
            chat_history,
            current_message: message.to_string(),
            current_intent: None,
            current_state: ChatState::NewMessage,
            created_exercise: None,
            generated_workout: None,
            response: None,
            error: None,
        }
    }

    /// Continue a slot-filling exchange from a previous turn.
    pub fn resume(mut self, pending: PendingDialogue) -> Self {
        self.current_state = pending.current_state;
        self.current_intent = Some(pending.current_intent.sanitized());
        self
    }

    /// Mark the turn failed with a user-facing apology.
    pub fn fail(&mut self, error: impl ToString, response: &str) {
        self.current_state = ChatState::Error;
        self.error = Some(error.to_string());
        self.response = Some(response.to_string());
    }

    /// Pending slot-filling state to persist, if the turn stopped mid-gathering.
    pub fn pending(&self) -> Option<PendingDialogue> {
        match (&self.current_state, &self.current_intent) {
            (ChatState::GatheringRequirements, Some(intent)) => Some(PendingDialogue {
                current_state: ChatState::GatheringRequirements,
                current_intent: intent.clone(),
            }),
            _ => None,
        }
    }
}

/// Outcome of one processed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub session_id: String,
    pub response: String,
    pub current_state: ChatState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_exercise: Option<Exercise>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_workout: Option<WorkoutTemplate>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(Intent::new(IntentType::CreateExercise, 1.5, Map::new()).confidence(), 1.0);
        assert_eq!(Intent::new(IntentType::CreateExercise, -0.2, Map::new()).confidence(), 0.0);
        assert_eq!(Intent::new(IntentType::CreateExercise, f64::NAN, Map::new()).confidence(), 0.0);
        assert_eq!(Intent::new(IntentType::GenerateWorkout, 0.8, Map::new()).confidence(), 0.8);
    }

    #[test]
    fn deserialized_intent_is_sanitized_on_resume() {
        let raw = serde_json::json!({
            "current_state": "gathering_requirements",
            "current_intent": { "type": "create_exercise", "confidence": 3.0, "parameters": {} }
        });
        let pending: PendingDialogue = serde_json::from_value(raw).unwrap();
        let state = ConversationState::new("s", "u", "chest", Vec::new(), Map::new()).resume(pending);

        let intent = state.current_intent.unwrap();
        assert_eq!(intent.kind, IntentType::CreateExercise);
        assert_eq!(intent.confidence(), 1.0);
        assert_eq!(state.current_state, ChatState::GatheringRequirements);
    }

    #[test]
    fn unrecognized_intent_type_maps_to_unknown() {
        let intent: Intent =
            serde_json::from_value(serde_json::json!({ "type": "dance", "confidence": 0.9 })).unwrap();
        assert_eq!(intent.kind, IntentType::Unknown);
        assert!(intent.parameters.is_empty());
    }
}
