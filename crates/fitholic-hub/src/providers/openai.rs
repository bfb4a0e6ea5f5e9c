//! OpenAI-compatible provider — works with OpenAI, Ollama, OpenRouter, Gemini, Groq.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::message::{LlmResponse, TokenUsage};
use fitholic_core::provider::{ChatRequest, LlmProvider, ProviderConfig, ResponseFormat};

/// OpenAI-compatible chat completions provider.
///
/// Structured-output requests are sent as `response_format: json_schema`.
pub struct OpenAiProvider {
    client: Client,
    config: ProviderConfig,
    api_url: String,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        let api_url = format!("{}/chat/completions", api_base.trim_end_matches('/'));

        Self {
            client: Client::new(),
            config,
            api_url,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// Default API base for the OpenAI-compatible providers we know about.
pub fn default_api_base(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("https://api.openai.com/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "gemini" => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        _ => None,
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [fitholic_core::message::ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    model: String,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn response_format(format: &ResponseFormat) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": format.name,
            "schema": format.schema,
        }
    })
}

fn truncate(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.config.provider
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse> {
        let model = request.model.as_deref().unwrap_or(&self.config.model);

        info!("Calling {} model: {}", self.config.provider, model);

        let mut max_tokens = request.max_tokens;
        if self.config.provider == "groq" {
            // Groq counts max_tokens against the per-minute budget up front.
            max_tokens = max_tokens.min(1024);
        }

        let body = ApiRequest {
            model,
            messages: &request.messages,
            max_tokens,
            temperature: request.temperature,
            response_format: request.response_format.as_ref().map(response_format),
        };

        let api_key = self.config.api_key.as_deref().unwrap_or("");

        let resp = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let body_text = resp.text().await?;

        debug!("API response status: {}, body length: {}", status, body_text.len());

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiError>(&body_text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate(&body_text).to_string());
            return Err(FitholicError::Provider(format!(
                "{} API error ({}): {}",
                self.config.provider, status, detail
            )));
        }

        let api_resp: ApiResponse = serde_json::from_str(&body_text).map_err(|e| {
            FitholicError::Provider(format!(
                "Failed to parse response: {} (body: {})",
                e,
                truncate(&body_text)
            ))
        })?;

        let choice = api_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| FitholicError::Provider("No choices in response".to_string()))?;

        let usage = api_resp
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens.unwrap_or(0),
                completion_tokens: u.completion_tokens.unwrap_or(0),
                total_tokens: u.total_tokens.unwrap_or(0),
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content: choice.message.content,
            model: api_resp.model,
            usage,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
        })
    }
}
