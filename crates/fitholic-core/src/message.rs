//! Message types — chat history entries and LLM request/response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse a stored role string, treating anything unknown as a user turn.
    pub fn parse(value: &str) -> Self {
        match value {
            "system" => Self::System,
            "assistant" => Self::Assistant,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message sent to an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
        }
    }
}

/// One stored turn of a chat session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// `role: content`, the form prompts embed recent turns in.
    pub fn to_prompt_line(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

/// Format the last `n` history entries for inclusion in a prompt.
pub fn recent_turns(history: &[HistoryEntry], n: usize) -> Vec<String> {
    let start = history.len().saturating_sub(n);
    history[start..].iter().map(HistoryEntry::to_prompt_line).collect()
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: String,
}

impl LlmResponse {
    /// Text content, empty when the provider returned none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_turns_keeps_tail() {
        let history: Vec<HistoryEntry> = ["a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                HistoryEntry::new(role, c)
            })
            .collect();

        let lines = recent_turns(&history, 3);
        assert_eq!(lines, vec!["assistant: b", "user: c", "assistant: d"]);
        assert_eq!(recent_turns(&history[..1], 3), vec!["user: a"]);
    }
}
