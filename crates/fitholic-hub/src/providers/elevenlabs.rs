//! ElevenLabs text-to-speech.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use fitholic_core::config::SpeechSettings;
use fitholic_core::error::{FitholicError, Result};
use fitholic_core::speech::TextToSpeech;

const API_BASE: &str = "https://api.elevenlabs.io/v1";

pub struct ElevenLabsTts {
    client: Client,
    api_key: String,
    api_url: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Clone, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

impl ElevenLabsTts {
    pub fn new(api_key: &str, settings: &SpeechSettings) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            api_url: format!("{}/text-to-speech/{}", API_BASE, settings.voice_id),
            model_id: settings.tts_model.clone(),
            voice_settings: VoiceSettings {
                stability: settings.stability,
                similarity_boost: settings.similarity_boost,
            },
        }
    }
}

#[async_trait]
impl TextToSpeech for ElevenLabsTts {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let body = SynthesisRequest {
            text,
            model_id: &self.model_id,
            voice_settings: &self.voice_settings,
        };

        let resp = self
            .client
            .post(&self.api_url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(FitholicError::Speech(format!(
                "ElevenLabs API error ({}): {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let audio = resp.bytes().await?;
        debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }
}
