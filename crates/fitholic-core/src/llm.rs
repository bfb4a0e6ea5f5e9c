//! LLM client — a provider handle with timeout/retry and structured output helpers.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{FitholicError, Result};
use crate::provider::{ChatRequest, LlmProvider};
use crate::retry::RetryPolicy;

/// Cheap-to-clone handle every dialogue node and voice stage calls the LLM through.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn LlmProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Plain text completion.
    pub async fn complete(&self, request: ChatRequest) -> Result<String> {
        let provider = self.provider.clone();
        let response = self
            .retry
            .run(provider.name(), || {
                let provider = provider.clone();
                let request = request.clone();
                async move { provider.chat(request).await }
            })
            .await?;

        debug!(
            "LLM {} answered with {} chars ({} tokens)",
            response.model,
            response.text().len(),
            response.usage.total_tokens
        );
        Ok(response.text().trim().to_string())
    }

    /// Structured completion, deserialized into `T`.
    ///
    /// The request should carry a response format; the body is still parsed
    /// leniently because some OpenAI-compatible servers ignore it and wrap
    /// JSON in a markdown fence.
    pub async fn complete_json<T: DeserializeOwned>(&self, request: ChatRequest) -> Result<T> {
        let text = self.complete(request).await?;
        parse_json_reply(&text)
    }
}

/// Parse a JSON object out of an LLM reply.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let json = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => &body[start..=end],
        _ => {
            return Err(FitholicError::Provider(format!(
                "Expected a JSON object, got: {}",
                body.chars().take(120).collect::<String>()
            )));
        }
    };
    Ok(serde_json::from_str(json)?)
}
