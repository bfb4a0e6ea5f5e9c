//! Whisper speech-to-text over the OpenAI audio transcription API.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::speech::SpeechToText;

pub struct WhisperStt {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Deserialize)]
struct Transcription {
    text: String,
}

impl WhisperStt {
    pub fn new(api_key: &str, api_base: Option<&str>, model: &str) -> Self {
        let base = api_base.unwrap_or("https://api.openai.com/v1");
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            api_url: format!("{}/audio/transcriptions", base.trim_end_matches('/')),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperStt {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let file = Part::bytes(audio.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let form = Form::new()
            .text("model", self.model.clone())
            .part("file", file);

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!("Whisper response status: {}, body length: {}", status, body.len());

        if !status.is_success() {
            return Err(FitholicError::Speech(format!(
                "Whisper API error ({}): {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let transcription: Transcription = serde_json::from_str(&body)?;
        Ok(transcription.text)
    }
}
