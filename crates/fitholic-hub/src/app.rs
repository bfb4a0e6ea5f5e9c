//! Service wiring — builds the chat and voice services from config.

use std::sync::Arc;

use tracing::{info, warn};

use fitholic_core::chat::ChatService;
use fitholic_core::config::FitholicConfig;
use fitholic_core::dialogue::DialogueEngine;
use fitholic_core::error::Result;
use fitholic_core::llm::LlmClient;
use fitholic_core::provider::LlmProvider;
use fitholic_core::voice::{VoiceInterpreter, VoiceProcessor};

use crate::generators::{LlmExerciseGenerator, LlmWorkoutGenerator};
use crate::memory::SqliteStore;
use crate::providers::{create_provider, create_stt, create_tts};
use crate::tools::voice_tools;

/// Everything the API and CLI need, sharing one store.
pub struct Services {
    pub chat: Arc<ChatService>,
    pub voice: Arc<VoiceProcessor>,
    pub store: Arc<SqliteStore>,
    pub provider_name: String,
    pub model: String,
}

impl Services {
    /// Open the configured database and build every service on top of it.
    pub fn from_config(config: &FitholicConfig) -> Result<Self> {
        let store = Arc::new(SqliteStore::open(&config.database_path())?);
        Self::with_store(config, store)
    }

    pub fn with_store(config: &FitholicConfig, store: Arc<SqliteStore>) -> Result<Self> {
        Self::with_provider(config, store, create_provider(&config.provider)?)
    }

    /// Build on an already-constructed chat provider. The `[generation]`
    /// override, when present, still comes from config.
    pub fn with_provider(
        config: &FitholicConfig,
        store: Arc<SqliteStore>,
        provider: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let chat_llm = LlmClient::new(provider, config.retry.clone());
        let generation_llm = match &config.generation {
            Some(generation) => LlmClient::new(create_provider(generation)?, config.retry.clone()),
            None => chat_llm.clone(),
        };

        let exercise_generator = Arc::new(LlmExerciseGenerator::new(
            generation_llm.clone(),
            store.clone(),
        ));
        let workout_generator = Arc::new(LlmWorkoutGenerator::new(
            generation_llm,
            exercise_generator.clone(),
            store.clone(),
            store.clone(),
        ));

        let engine = DialogueEngine::new(
            chat_llm.clone(),
            exercise_generator,
            workout_generator,
            store.clone(),
        );
        let chat = Arc::new(ChatService::new(Arc::new(engine), store.clone()));

        let stt = match create_stt(config) {
            Ok(stt) => Some(stt),
            Err(e) => {
                warn!("Voice audio commands disabled: {}", e);
                None
            }
        };
        let tts = create_tts(config);
        if tts.is_none() {
            info!("No text-to-speech key configured, voice responses are text only");
        }

        let interpreter = VoiceInterpreter::new(chat_llm, Arc::new(voice_tools()));
        let voice = Arc::new(VoiceProcessor::new(
            stt,
            tts,
            interpreter,
            store.clone(),
            store.clone(),
            store.clone(),
            config.retry.clone(),
        ));

        Ok(Self {
            chat,
            voice,
            store,
            provider_name: config.provider.provider.clone(),
            model: config.provider.model.clone(),
        })
    }
}
