//! LLM Provider trait — the abstraction over different AI model APIs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{ChatMessage, LlmResponse};

/// JSON-schema constrained output request (OpenAI `response_format`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFormat {
    pub name: String,
    pub schema: serde_json::Value,
}

/// Configuration for a provider request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider for structured JSON output matching a schema.
    pub response_format: Option<ResponseFormat>,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            model: None,
            max_tokens: 1000,
            temperature: 0.7,
            response_format: None,
        }
    }
}

impl ChatRequest {
    /// A system + user prompt pair.
    pub fn prompt(system: &str, user: &str) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            ..Default::default()
        }
    }

    pub fn with_schema(mut self, name: &str, schema: serde_json::Value) -> Self {
        self.response_format = Some(ResponseFormat {
            name: name.to_string(),
            schema,
        });
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// LLM Provider trait — implement this to add support for new AI providers.
///
/// # Example
///
/// ```rust,ignore
/// struct MyProvider;
///
/// #[async_trait]
/// impl LlmProvider for MyProvider {
///     fn name(&self) -> &str { "my-provider" }
///     fn default_model(&self) -> &str { "my-model-v1" }
///
///     async fn chat(&self, request: ChatRequest) -> Result<LlmResponse> {
///         // Call your API here
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai", "gemini", "ollama").
    fn name(&self) -> &str;

    /// Default model for this provider.
    fn default_model(&self) -> &str;

    /// Send a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse>;
}

/// Provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Models tried in order when the primary model fails.
    #[serde(default)]
    pub fallback_models: Vec<String>,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            api_base: None,
            max_tokens: 1000,
            temperature: 0.7,
            fallback_models: Vec::new(),
        }
    }
}
