//! Speech capabilities used by the voice pipeline.

use async_trait::async_trait;

use crate::error::Result;

/// Speech-to-text (e.g., Whisper).
#[async_trait]
pub trait SpeechToText: Send + Sync {
    fn name(&self) -> &str;

    /// Transcribe an encoded audio clip.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Text-to-speech (e.g., ElevenLabs).
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    fn name(&self) -> &str;

    /// Synthesize speech, returning encoded audio bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
