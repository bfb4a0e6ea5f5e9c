//! Router — the pure transition function of the dialogue state machine.

use super::state::{ChatState, Intent, IntentType};

/// Minimum parser confidence before an intent is acted on.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Node the engine visits next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Next {
    ParseMessage,
    CreateExercise,
    GenerateWorkout,
    Motivate,
    End,
}

impl Next {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseMessage => "parse_message",
            Self::CreateExercise => "create_exercise",
            Self::GenerateWorkout => "generate_workout",
            Self::Motivate => "motivate",
            Self::End => "end",
        }
    }
}

impl std::fmt::Display for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot-filling node handling an intent type, if any.
fn handler_for(kind: IntentType) -> Option<Next> {
    match kind {
        IntentType::CreateExercise => Some(Next::CreateExercise),
        IntentType::GenerateWorkout => Some(Next::GenerateWorkout),
        IntentType::LogWorkout | IntentType::Unknown => None,
    }
}

/// Map `(state, intent)` to the next node.
pub fn route(state: ChatState, intent: Option<&Intent>) -> Next {
    match state {
        ChatState::NewMessage => Next::ParseMessage,
        ChatState::IntentParsed => match intent {
            Some(intent)
                if intent.kind != IntentType::Unknown
                    && intent.confidence() >= CONFIDENCE_THRESHOLD =>
            {
                handler_for(intent.kind).unwrap_or(Next::Motivate)
            }
            _ => Next::Motivate,
        },
        ChatState::Motivated => Next::End,
        ChatState::GatheringRequirements => intent
            .and_then(|i| handler_for(i.kind))
            .unwrap_or(Next::End),
        ChatState::ExerciseCreated | ChatState::WorkoutGenerated | ChatState::Error => Next::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn intent(kind: IntentType, confidence: f64) -> Intent {
        Intent::new(kind, confidence, Map::new())
    }

    #[test]
    fn routing_table() {
        let create_low = intent(IntentType::CreateExercise, 0.5);
        let create_high = intent(IntentType::CreateExercise, 0.9);
        let workout = intent(IntentType::GenerateWorkout, 0.7);
        let log = intent(IntentType::LogWorkout, 0.95);
        let unknown = intent(IntentType::Unknown, 1.0);

        let cases = [
            (ChatState::NewMessage, None, Next::ParseMessage),
            (ChatState::NewMessage, Some(&create_high), Next::ParseMessage),
            (ChatState::IntentParsed, Some(&create_low), Next::Motivate),
            (ChatState::IntentParsed, Some(&create_high), Next::CreateExercise),
            (ChatState::IntentParsed, Some(&workout), Next::GenerateWorkout),
            (ChatState::IntentParsed, Some(&log), Next::Motivate),
            (ChatState::IntentParsed, Some(&unknown), Next::Motivate),
            (ChatState::IntentParsed, None, Next::Motivate),
            (ChatState::Motivated, Some(&create_high), Next::End),
            (ChatState::Motivated, None, Next::End),
            (ChatState::GatheringRequirements, Some(&create_low), Next::CreateExercise),
            (ChatState::GatheringRequirements, Some(&workout), Next::GenerateWorkout),
            (ChatState::GatheringRequirements, Some(&log), Next::End),
            (ChatState::GatheringRequirements, None, Next::End),
            (ChatState::ExerciseCreated, Some(&create_high), Next::End),
            (ChatState::WorkoutGenerated, None, Next::End),
            (ChatState::Error, Some(&workout), Next::End),
        ];

        for (state, intent, expected) in cases {
            assert_eq!(route(state, intent), expected, "{} / {:?}", state, intent);
            // Same inputs, same answer.
            assert_eq!(route(state, intent), route(state, intent));
        }
    }
}
