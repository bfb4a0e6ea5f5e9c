//! Conversational workflow: intent parsing, routing, slot-filling, and generation.

pub mod engine;
pub mod exercise;
pub mod motivation;
pub mod parser;
pub mod router;
pub mod slots;
pub mod state;
pub mod workout;

pub use engine::DialogueEngine;
pub use router::{CONFIDENCE_THRESHOLD, Next, route};
pub use state::{ChatState, ConversationState, Intent, IntentType, PendingDialogue, TurnResult};
