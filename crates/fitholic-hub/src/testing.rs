//! Scripted LLM provider for hub unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::llm::LlmClient;
use fitholic_core::message::{LlmResponse, TokenUsage};
use fitholic_core::provider::{ChatRequest, LlmProvider};
use fitholic_core::retry::RetryPolicy;

pub struct ScriptedProvider {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<std::result::Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
        })
    }

    pub fn client(self: &Arc<Self>) -> LlmClient {
        LlmClient::new(self.clone(), RetryPolicy::no_retry())
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<LlmResponse> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));
        match reply {
            Ok(content) => Ok(LlmResponse {
                content: Some(content),
                model: "scripted-model".into(),
                usage: TokenUsage::default(),
                finish_reason: "stop".into(),
            }),
            Err(e) => Err(FitholicError::Provider(e)),
        }
    }
}
