//! Provider with automatic model fallback.
//!
//! Wraps any LlmProvider and tries alternative models if the primary fails.

use async_trait::async_trait;
use tracing::{info, warn};

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::message::LlmResponse;
use fitholic_core::provider::{ChatRequest, LlmProvider};

/// Provider wrapper that supports automatic model fallback.
///
/// If the primary model fails, it tries the fallback models in order.
pub struct FallbackProvider<P: LlmProvider> {
    inner: P,
    fallback_models: Vec<String>,
}

impl<P: LlmProvider> FallbackProvider<P> {
    pub fn new(inner: P, fallbacks: Vec<String>) -> Self {
        Self {
            inner,
            fallback_models: fallbacks,
        }
    }
}

#[async_trait]
impl<P: LlmProvider> LlmProvider for FallbackProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse> {
        match self.inner.chat(request.clone()).await {
            Ok(resp) => return Ok(resp),
            Err(e) => {
                if self.fallback_models.is_empty() {
                    return Err(e);
                }
                warn!(
                    "Primary model failed: {}. Trying {} fallback(s)...",
                    e,
                    self.fallback_models.len()
                );
            }
        }

        for (i, model) in self.fallback_models.iter().enumerate() {
            info!(
                "Trying fallback model {}/{}: {}",
                i + 1,
                self.fallback_models.len(),
                model
            );

            let fallback_request = ChatRequest {
                model: Some(model.clone()),
                ..request.clone()
            };

            match self.inner.chat(fallback_request).await {
                Ok(resp) => {
                    info!("Fallback model {} succeeded", model);
                    return Ok(resp);
                }
                Err(e) => warn!("Fallback model {} failed: {}", model, e),
            }
        }

        Err(FitholicError::Provider(
            "All models (primary + fallbacks) failed".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitholic_core::message::TokenUsage;
    use std::sync::Mutex;

    /// Fails for every model except `good`.
    struct PickyProvider {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for PickyProvider {
        fn name(&self) -> &str {
            "picky"
        }
        fn default_model(&self) -> &str {
            "primary"
        }
        async fn chat(&self, request: ChatRequest) -> Result<LlmResponse> {
            let model = request.model.unwrap_or_else(|| "primary".into());
            self.seen.lock().unwrap().push(model.clone());
            if model == "good" {
                Ok(LlmResponse {
                    content: Some("ok".into()),
                    model,
                    usage: TokenUsage::default(),
                    finish_reason: "stop".into(),
                })
            } else {
                Err(FitholicError::Provider(format!("{} unavailable", model)))
            }
        }
    }

    #[tokio::test]
    async fn falls_through_to_working_model() {
        let provider = FallbackProvider::new(
            PickyProvider { seen: Mutex::new(vec![]) },
            vec!["bad".into(), "good".into()],
        );
        let resp = provider.chat(ChatRequest::prompt("s", "u")).await.unwrap();
        assert_eq!(resp.model, "good");
        assert_eq!(*provider.inner.seen.lock().unwrap(), vec!["primary", "bad", "good"]);
    }

    #[tokio::test]
    async fn no_fallbacks_returns_primary_error() {
        let provider = FallbackProvider::new(PickyProvider { seen: Mutex::new(vec![]) }, vec![]);
        let err = provider.chat(ChatRequest::prompt("s", "u")).await.unwrap_err();
        assert!(err.to_string().contains("primary unavailable"));
    }
}
