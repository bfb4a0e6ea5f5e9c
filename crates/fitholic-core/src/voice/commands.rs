//! Parsed voice commands and the regex fast path for common phrasings.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const LOG_SET: &str = "log_set";
pub const NAVIGATE_EXERCISE: &str = "navigate_exercise";
pub const COMPLETE_SESSION: &str = "complete_session";
pub const START_REST_TIMER: &str = "start_rest_timer";
pub const GET_EXERCISE_INFO: &str = "get_exercise_info";
pub const HELP: &str = "help";

pub const TOOL_NAMES: &[&str] = &[
    LOG_SET,
    NAVIGATE_EXERCISE,
    COMPLETE_SESSION,
    START_REST_TIMER,
    GET_EXERCISE_INFO,
    HELP,
];

/// Rest length when the user does not say one.
pub const DEFAULT_REST_SECS: u64 = 60;

/// A tool invocation parsed from an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCommand {
    pub tool: String,
    #[serde(default = "empty_args")]
    pub args: Value,
}

fn empty_args() -> Value {
    json!({})
}

impl VoiceCommand {
    pub fn new(tool: &str, args: Value) -> Self {
        Self {
            tool: tool.to_string(),
            args,
        }
    }
}

struct CommandPatterns {
    log_set: Regex,
    rest_before: Regex,
    rest_after: Regex,
    rest_bare: Regex,
    finish: Regex,
    info: Regex,
    help: Regex,
    skip: Regex,
    previous: Regex,
    next: Regex,
}

static PATTERNS: LazyLock<CommandPatterns> = LazyLock::new(|| CommandPatterns {
    log_set: Regex::new(
        r"(?i)\b(?:log(?:ged)?|did|completed?|done)\s+(\d+)\s*(?:reps?|repetitions?)(?:\s+(at|with|using)\b\s*(\d+(?:\.\d+)?)?|\s+(\d+(?:\.\d+)?)\s*(?:lbs?|pounds?|kgs?|kilos?)\b)?",
    )
    .expect("valid log_set regex"),
    rest_before: Regex::new(
        r"(?i)\b(?:start|begin|set)\s+(?:a\s+)?(\d+)[\s-]*(?:seconds?|secs?)\s+(?:rest|break|timer)",
    )
    .expect("valid command regex"),
    rest_after: Regex::new(
        r"(?i)\b(?:start|begin|set)\s+(?:a\s+)?(?:rest|break|timer)(?:\s+timer)?\s+for\s+(\d+)\s*(?:seconds?|secs?)?",
    )
    .expect("valid command regex"),
    rest_bare: Regex::new(r"(?i)\b(?:start|begin)\s+(?:a\s+|the\s+)?(?:rest|break)(?:\s+timer)?\b")
        .expect("valid command regex"),
    finish: Regex::new(
        r"(?i)\b(?:finish|end|complete|done with)\s+(?:the\s+|my\s+|this\s+)?(?:workout|session)\b",
    )
    .expect("valid command regex"),
    info: Regex::new(r"(?i)\b(?:how many sets|sets left|progress|where am i)\b")
        .expect("valid command regex"),
    help: Regex::new(r"(?i)^\s*(?:help|what can i say)\b").expect("valid command regex"),
    skip: Regex::new(r"(?i)\bskip\b").expect("valid command regex"),
    previous: Regex::new(
        r"(?i)^\s*(?:previous|back)\s*[.!]?\s*$|\b(?:go back|previous (?:exercise|one)|back to the (?:last|previous))\b",
    )
    .expect("valid command regex"),
    next: Regex::new(
        r"(?i)^\s*(?:next|continue)\s*[.!]?\s*$|\b(?:next (?:exercise|one)|move on|go to the next)\b",
    )
    .expect("valid command regex"),
});

/// Match common phrasings without an LLM call.
pub fn parse_with_patterns(text: &str) -> Option<VoiceCommand> {
    let p = &*PATTERNS;

    if let Some(caps) = p.log_set.captures(text) {
        let reps: u64 = caps[1].parse().ok()?;
        // "at"/"with" without a readable number is left to the LLM.
        let weight: f64 = if caps.get(2).is_some() {
            caps.get(3)?.as_str().parse().ok()?
        } else {
            match caps.get(4) {
                Some(w) => w.as_str().parse().ok()?,
                None => 0.0,
            }
        };
        return Some(VoiceCommand::new(
            LOG_SET,
            json!({ "reps": reps, "weight": weight }),
        ));
    }

    if let Some(caps) = p.rest_before.captures(text).or_else(|| p.rest_after.captures(text)) {
        let duration: u64 = caps[1].parse().ok()?;
        return Some(VoiceCommand::new(START_REST_TIMER, json!({ "duration": duration })));
    }
    if p.rest_bare.is_match(text) {
        return Some(VoiceCommand::new(
            START_REST_TIMER,
            json!({ "duration": DEFAULT_REST_SECS }),
        ));
    }

    if p.finish.is_match(text) {
        return Some(VoiceCommand::new(COMPLETE_SESSION, json!({ "notes": null })));
    }
    if p.info.is_match(text) {
        return Some(VoiceCommand::new(GET_EXERCISE_INFO, json!({})));
    }
    if p.help.is_match(text) {
        return Some(VoiceCommand::new(HELP, json!({})));
    }

    let action = if p.skip.is_match(text) {
        "skip"
    } else if p.previous.is_match(text) {
        "previous"
    } else if p.next.is_match(text) {
        "next"
    } else {
        return None;
    };
    Some(VoiceCommand::new(NAVIGATE_EXERCISE, json!({ "action": action })))
}
