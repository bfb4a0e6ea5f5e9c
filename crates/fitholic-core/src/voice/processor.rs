//! Voice processor — speech-to-text, command interpretation, text-to-speech,
//! plus the lifecycle of the ongoing workout log the commands act on.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use super::interpreter::VoiceInterpreter;
use crate::error::{FitholicError, Result};
use crate::retry::RetryPolicy;
use crate::speech::{SpeechToText, TextToSpeech};
use crate::store::{ExerciseStore, WorkoutLogStore, WorkoutTemplateStore};
use crate::tool::ToolContext;
use crate::workout::WorkoutLog;

pub const FALLBACK_RESPONSE: &str = "Sorry, I couldn't process that command. Please try again.";

/// What the client gets back for one voice command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub transcription: String,
    pub command: Value,
    pub response_text: String,
    /// Base64-encoded audio, absent when synthesis was unavailable.
    pub response_audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VoiceResponse {
    fn fallback(transcription: &str, error: &FitholicError) -> Self {
        Self {
            transcription: transcription.to_string(),
            command: serde_json::json!({ "type": "error" }),
            response_text: FALLBACK_RESPONSE.to_string(),
            response_audio: None,
            error: Some(error.to_string()),
        }
    }
}

pub struct VoiceProcessor {
    /// None when no transcription service is configured; text commands still work.
    stt: Option<Arc<dyn SpeechToText>>,
    tts: Option<Arc<dyn TextToSpeech>>,
    interpreter: VoiceInterpreter,
    logs: Arc<dyn WorkoutLogStore>,
    templates: Arc<dyn WorkoutTemplateStore>,
    exercises: Arc<dyn ExerciseStore>,
    retry: RetryPolicy,
}

impl VoiceProcessor {
    pub fn new(
        stt: Option<Arc<dyn SpeechToText>>,
        tts: Option<Arc<dyn TextToSpeech>>,
        interpreter: VoiceInterpreter,
        logs: Arc<dyn WorkoutLogStore>,
        templates: Arc<dyn WorkoutTemplateStore>,
        exercises: Arc<dyn ExerciseStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            stt,
            tts,
            interpreter,
            logs,
            templates,
            exercises,
            retry,
        }
    }

    /// Full pipeline for one recorded utterance.
    ///
    /// Fails only with `NoActiveSession`; service failures yield the fixed
    /// fallback response without audio.
    pub async fn process_voice_command(&self, user_id: &str, audio: &[u8]) -> Result<VoiceResponse> {
        let log = self.require_ongoing(user_id).await?;
        if audio.is_empty() {
            return Err(FitholicError::Validation("No audio provided".into()));
        }

        let Some(stt) = &self.stt else {
            let e = FitholicError::Config("speech-to-text is not configured".into());
            warn!("Voice command from {} rejected: {}", user_id, e);
            return Ok(VoiceResponse::fallback("", &e));
        };

        let transcription = match self.retry.run(stt.name(), || stt.transcribe(audio)).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                error!("Transcription failed for {}: {}", user_id, e);
                return Ok(VoiceResponse::fallback("", &e));
            }
        };
        info!("Transcribed voice command for {}: {:?}", user_id, transcription);

        Ok(self.handle_text(user_id, &log, &transcription).await)
    }

    /// Same pipeline for an already-transcribed command.
    pub async fn process_text_command(&self, user_id: &str, text: &str) -> Result<VoiceResponse> {
        let log = self.require_ongoing(user_id).await?;
        if text.trim().is_empty() {
            return Err(FitholicError::Validation("Command text must not be empty".into()));
        }
        Ok(self.handle_text(user_id, &log, text.trim()).await)
    }

    async fn handle_text(&self, user_id: &str, log: &WorkoutLog, transcription: &str) -> VoiceResponse {
        let ctx = self.tool_context(user_id, &log.log_id);
        let outcome = match self.interpreter.interpret(&ctx, transcription).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Voice command processing failed for {}: {}", user_id, e);
                return VoiceResponse::fallback(transcription, &e);
            }
        };

        let response_audio = self.synthesize(&outcome.response_text).await;
        VoiceResponse {
            transcription: outcome.transcription,
            command: outcome.command,
            response_text: outcome.response_text,
            response_audio,
            error: None,
        }
    }

    async fn synthesize(&self, text: &str) -> Option<String> {
        let tts = self.tts.as_ref()?;
        match self.retry.run(tts.name(), || tts.synthesize(text)).await {
            Ok(audio) => Some(BASE64.encode(audio)),
            Err(e) => {
                warn!("Speech synthesis failed, returning text only: {}", e);
                None
            }
        }
    }

    pub fn tools(&self) -> &crate::tool::ToolRegistry {
        self.interpreter.tools()
    }

    pub fn has_speech_input(&self) -> bool {
        self.stt.is_some()
    }

    pub fn has_speech_output(&self) -> bool {
        self.tts.is_some()
    }

    fn tool_context(&self, user_id: &str, log_id: &str) -> ToolContext {
        ToolContext {
            user_id: user_id.to_string(),
            log_id: log_id.to_string(),
            logs: self.logs.clone(),
            templates: self.templates.clone(),
            exercises: self.exercises.clone(),
        }
    }

    async fn require_ongoing(&self, user_id: &str) -> Result<WorkoutLog> {
        self.logs
            .get_ongoing(user_id)
            .await?
            .ok_or(FitholicError::NoActiveSession)
    }

    pub async fn ongoing_log(&self, user_id: &str) -> Result<Option<WorkoutLog>> {
        self.logs.get_ongoing(user_id).await
    }

    /// Return the user's ongoing log, or start a new one (from a template when given).
    pub async fn start_session(&self, user_id: &str, template_id: Option<&str>) -> Result<WorkoutLog> {
        if let Some(existing) = self.logs.get_ongoing(user_id).await? {
            info!("User {} already has ongoing log {}", user_id, existing.log_id);
            return Ok(existing);
        }

        let mut log = match template_id {
            Some(id) => {
                let template = self
                    .templates
                    .get(id)
                    .await?
                    .ok_or_else(|| FitholicError::NotFound(format!("Workout template {}", id)))?;
                WorkoutLog::from_template(user_id, &template)
            }
            None => WorkoutLog::scheduled(user_id),
        };
        log.start(Utc::now())?;
        self.logs.create(&log).await?;
        info!("Started workout log {} for {}", log.log_id, user_id);
        Ok(log)
    }

    /// Complete the ongoing log. Rejected while exercises remain incomplete.
    pub async fn end_session(&self, user_id: &str, notes: Option<String>) -> Result<WorkoutLog> {
        let mut log = self.require_ongoing(user_id).await?;
        log.complete(Utc::now(), notes)?;
        self.logs.update(&log).await?;
        info!("Completed workout log {} for {}", log.log_id, user_id);
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryWorkoutStore;
    use crate::testing::ScriptedProvider;
    use crate::tool::ToolRegistry;
    use crate::workout::{TemplateExercise, WorkoutStatus, WorkoutTemplate};
    use async_trait::async_trait;

    struct FixedStt(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl SpeechToText for FixedStt {
        fn name(&self) -> &str {
            "fixed-stt"
        }
        async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
            self.0
                .map(str::to_string)
                .map_err(|e| FitholicError::Speech(e.to_string()))
        }
    }

    struct BrokenTts;

    #[async_trait]
    impl TextToSpeech for BrokenTts {
        fn name(&self) -> &str {
            "broken-tts"
        }
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Err(FitholicError::Speech("quota exceeded".into()))
        }
    }

    struct EchoTts;

    #[async_trait]
    impl TextToSpeech for EchoTts {
        fn name(&self) -> &str {
            "echo-tts"
        }
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            Ok(text.as_bytes().to_vec())
        }
    }

    fn processor(
        stt: FixedStt,
        tts: Option<Arc<dyn TextToSpeech>>,
        replies: Vec<std::result::Result<&str, &str>>,
        store: &Arc<InMemoryWorkoutStore>,
    ) -> VoiceProcessor {
        let provider = ScriptedProvider::new(replies);
        let interpreter = VoiceInterpreter::new(provider.client(), Arc::new(ToolRegistry::new()));
        VoiceProcessor::new(
            Some(Arc::new(stt)),
            tts,
            interpreter,
            store.clone(),
            store.clone(),
            store.clone(),
            RetryPolicy::no_retry(),
        )
    }

    async fn seed_template(store: &InMemoryWorkoutStore) {
        WorkoutTemplateStore::create(
            store,
            &WorkoutTemplate {
                template_id: "t1".into(),
                user_id: None,
                name: "Core".into(),
                description: None,
                difficulty: "beginner".into(),
                duration: Some(20),
                exercises: vec![TemplateExercise {
                    exercise_id: "plank".into(),
                    sets: 2,
                    reps: 1,
                    rest_time: 30,
                }],
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn no_ongoing_log_is_reported() {
        let store = Arc::new(InMemoryWorkoutStore::new());
        let voice = processor(FixedStt(Ok("next")), None, vec![], &store);

        let err = voice.process_voice_command("u1", b"audio").await.unwrap_err();
        assert!(matches!(err, FitholicError::NoActiveSession));
    }

    #[tokio::test]
    async fn stt_failure_gives_fixed_fallback() {
        let store = Arc::new(InMemoryWorkoutStore::new());
        let voice = processor(FixedStt(Err("bad audio")), None, vec![], &store);
        voice.start_session("u1", None).await.unwrap();

        let response = voice.process_voice_command("u1", b"audio").await.unwrap();
        assert_eq!(response.response_text, FALLBACK_RESPONSE);
        assert!(response.response_audio.is_none());
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn tts_failure_keeps_text() {
        let store = Arc::new(InMemoryWorkoutStore::new());
        let voice = processor(
            FixedStt(Ok("help")),
            Some(Arc::new(BrokenTts)),
            vec![Ok("Here is what you can say.")],
            &store,
        );
        voice.start_session("u1", None).await.unwrap();

        let response = voice.process_voice_command("u1", b"audio").await.unwrap();
        assert_eq!(response.transcription, "help");
        assert_eq!(response.response_text, "Here is what you can say.");
        assert!(response.response_audio.is_none());
    }

    #[tokio::test]
    async fn audio_is_base64_encoded() {
        let store = Arc::new(InMemoryWorkoutStore::new());
        let voice = processor(
            FixedStt(Ok("help")),
            Some(Arc::new(EchoTts)),
            vec![Ok("hi")],
            &store,
        );
        voice.start_session("u1", None).await.unwrap();

        let response = voice.process_voice_command("u1", b"audio").await.unwrap();
        assert_eq!(response.response_audio.as_deref(), Some("aGk="));
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let store = Arc::new(InMemoryWorkoutStore::new());
        seed_template(&store).await;
        let voice = processor(FixedStt(Ok("")), None, vec![], &store);

        let log = voice.start_session("u1", Some("t1")).await.unwrap();
        assert_eq!(log.status, WorkoutStatus::Ongoing);
        assert_eq!(log.exercises[0].sets.len(), 2);

        let again = voice.start_session("u1", Some("t1")).await.unwrap();
        assert_eq!(again.log_id, log.log_id);

        assert!(voice.end_session("u1", None).await.is_err());

        let mut current = voice.ongoing_log("u1").await.unwrap().unwrap();
        current.navigate(crate::workout::NavAction::Skip).unwrap();
        WorkoutLogStore::update(store.as_ref(), &current).await.unwrap();

        let done = voice.end_session("u1", Some("felt good".into())).await.unwrap();
        assert_eq!(done.status, WorkoutStatus::Completed);
        assert!(voice.ongoing_log("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_template_is_not_found() {
        let store = Arc::new(InMemoryWorkoutStore::new());
        let voice = processor(FixedStt(Ok("")), None, vec![], &store);
        let err = voice.start_session("u1", Some("missing")).await.unwrap_err();
        assert!(matches!(err, FitholicError::NotFound(_)));
    }
}
