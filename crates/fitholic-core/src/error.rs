//! Error types for Fitholic.

use thiserror::Error;

/// Core error type for all Fitholic operations.
#[derive(Error, Debug)]
pub enum FitholicError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Speech service error: {0}")]
    Speech(String),

    #[error("Tool execution error: {tool} — {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("No active workout session found")]
    NoActiveSession,

    #[error("Invalid status transition: {from} → {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl FitholicError {
    /// Whether a failed external call is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Provider(msg) | Self::Speech(msg) => {
                msg.contains("429") || msg.contains("500") || msg.contains("502")
                    || msg.contains("503") || msg.contains("504")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FitholicError>;
