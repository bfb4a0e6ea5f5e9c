pub mod elevenlabs;
pub mod fallback;
pub mod openai;
pub mod whisper;

use std::sync::Arc;

use fitholic_core::config::{FitholicConfig, resolve_api_key};
use fitholic_core::error::{FitholicError, Result};
use fitholic_core::provider::{LlmProvider, ProviderConfig};
use fitholic_core::speech::{SpeechToText, TextToSpeech};

pub use elevenlabs::ElevenLabsTts;
pub use fallback::FallbackProvider;
pub use openai::OpenAiProvider;
pub use whisper::WhisperStt;

/// Build an LLM provider from config, wrapped for model fallback when configured.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    let api_key = match config.provider.as_str() {
        "ollama" => Some("ollama".to_string()),
        _ => resolve_api_key(config),
    }
    .ok_or_else(|| {
        FitholicError::Config(format!("No API key configured for provider '{}'", config.provider))
    })?;

    let api_base = config
        .api_base
        .clone()
        .or_else(|| openai::default_api_base(&config.provider).map(str::to_string))
        .ok_or_else(|| {
            FitholicError::Config(format!(
                "Unknown provider '{}' needs an explicit api_base",
                config.provider
            ))
        })?;

    let provider = OpenAiProvider::new(ProviderConfig {
        api_key: Some(api_key),
        api_base: Some(api_base),
        ..config.clone()
    });

    if config.fallback_models.is_empty() {
        Ok(Arc::new(provider))
    } else {
        Ok(Arc::new(FallbackProvider::new(
            provider,
            config.fallback_models.clone(),
        )))
    }
}

/// Whisper transcription; requires an OpenAI-compatible key.
pub fn create_stt(config: &FitholicConfig) -> Result<Arc<dyn SpeechToText>> {
    let key = config
        .stt_api_key()
        .ok_or_else(|| FitholicError::Config("No speech-to-text API key configured".into()))?;
    Ok(Arc::new(WhisperStt::new(
        &key,
        config.speech.stt_api_base.as_deref(),
        &config.speech.stt_model,
    )))
}

/// ElevenLabs synthesis, or None when no key is configured (text-only responses).
pub fn create_tts(config: &FitholicConfig) -> Option<Arc<dyn TextToSpeech>> {
    config
        .tts_api_key()
        .map(|key| Arc::new(ElevenLabsTts::new(&key, &config.speech)) as Arc<dyn TextToSpeech>)
}
