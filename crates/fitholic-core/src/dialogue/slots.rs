//! Slot-filling helpers shared by the requirement-gathering nodes.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::llm::LlmClient;
use crate::provider::ChatRequest;

/// Sentinel meaning every required slot is filled.
pub const COMPLETE: &str = "COMPLETE";

pub const EXERCISE_TYPES: &[&str] = &["strength", "cardio", "flexibility", "balance", "plyometric"];

pub const MUSCLE_GROUPS: &[&str] = &[
    "chest",
    "back",
    "shoulders",
    "biceps",
    "triceps",
    "legs",
    "core",
    "full body",
];

pub const WORKOUT_TYPES: &[&str] = &["strength", "cardio", "hiit", "flexibility", "yoga", "endurance"];

pub const INTENSITIES: &[&str] = &["low", "moderate", "high"];

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})[\s-]*(minutes?|mins?|m|hours?|hrs?|h)\b").expect("valid duration regex")
});

static WORDED_HOUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(half\s+an?|an?|one)[\s-]+(?:hours?|hrs?)\b").expect("valid duration regex")
});

/// Outcome of a gathering step.
#[derive(Debug, Clone, PartialEq)]
pub enum Gathered {
    Complete,
    Ask(String),
}

fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + word.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// First vocabulary word found in the message.
pub fn find_keyword(message: &str, vocabulary: &[&'static str]) -> Option<&'static str> {
    let lower = message.to_lowercase();
    vocabulary.iter().copied().find(|w| contains_word(&lower, w))
}

/// Every vocabulary word found in the message, in vocabulary order.
pub fn find_keywords(message: &str, vocabulary: &[&'static str]) -> Vec<&'static str> {
    let lower = message.to_lowercase();
    vocabulary
        .iter()
        .copied()
        .filter(|w| contains_word(&lower, w))
        .collect()
}

/// Workout length in minutes from phrasings like "45 min" or "1 hour".
pub fn find_duration(message: &str) -> Option<u32> {
    let Some(caps) = DURATION.captures(message) else {
        let caps = WORDED_HOUR.captures(message)?;
        let half = caps[1].to_lowercase().starts_with("half");
        return Some(if half { 30 } else { 60 });
    };
    let amount: u32 = caps[1].parse().ok()?;
    let unit = caps[2].to_lowercase();
    if unit.starts_with('h') {
        Some(amount * 60)
    } else {
        Some(amount)
    }
}

/// Whether a parameter holds a usable value.
pub fn is_present(params: &Map<String, Value>, key: &str) -> bool {
    match params.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    }
}

/// Fill `key` from the message when it is still missing. Returns whether it was set.
pub fn fill_missing(params: &mut Map<String, Value>, key: &str, value: Option<Value>) -> bool {
    if is_present(params, key) {
        return false;
    }
    match value {
        Some(value) => {
            info!("Extracted {} from message: {}", key, value);
            params.insert(key.to_string(), value);
            true
        }
        None => false,
    }
}

/// Known parameters as a bullet list for the gathering prompt.
pub fn describe_params(params: &Map<String, Value>) -> String {
    let lines: Vec<String> = params
        .iter()
        .filter(|(key, _)| is_present(params, key))
        .map(|(key, value)| {
            let shown = match value {
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(", "),
                other => other.to_string(),
            };
            format!("- {}: {}", key, shown)
        })
        .collect();

    if lines.is_empty() {
        "No information provided yet".to_string()
    } else {
        lines.join("\n")
    }
}

/// Ask the LLM what to ask next; returns `Complete` when it answers the sentinel.
///
/// A failed LLM call falls back to `fallback_question`.
pub async fn next_question(
    llm: &LlmClient,
    system_prompt: &str,
    fallback_question: &str,
) -> Gathered {
    let request = ChatRequest::prompt(system_prompt, "What information should I ask for next?");
    match llm.complete(request).await {
        Ok(reply) if reply.trim().trim_matches('"').eq_ignore_ascii_case(COMPLETE) => {
            Gathered::Complete
        }
        Ok(reply) if reply.trim().is_empty() => Gathered::Ask(fallback_question.to_string()),
        Ok(reply) => Gathered::Ask(reply.trim().to_string()),
        Err(e) => {
            warn!("Requirement gathering LLM call failed: {}", e);
            Gathered::Ask(fallback_question.to_string())
        }
    }
}
