//! Voice path: mid-workout commands against the user's ongoing workout log.

pub mod commands;
pub mod interpreter;
pub mod processor;

pub use commands::{VoiceCommand, parse_with_patterns};
pub use interpreter::{CommandContext, VoiceInterpreter, VoiceOutcome};
pub use processor::{VoiceProcessor, VoiceResponse};
