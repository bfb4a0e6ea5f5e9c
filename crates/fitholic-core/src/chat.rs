//! Chat service — wraps the dialogue engine with history and context persistence.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::dialogue::engine::turn_result;
use crate::dialogue::{ConversationState, DialogueEngine, PendingDialogue, TurnResult};
use crate::error::{FitholicError, Result};
use crate::memory::{ChatSession, SessionStore};
use crate::message::{HistoryEntry, Role};

/// History entries loaded as dialogue context.
pub const HISTORY_LIMIT: usize = 10;

/// Context type holding the user's profile map.
pub const PROFILE_CONTEXT: &str = "user_profile";

/// Context type holding unfinished slot-filling state.
pub const DIALOGUE_CONTEXT: &str = "dialogue";

pub struct ChatService {
    engine: Arc<DialogueEngine>,
    sessions: Arc<dyn SessionStore>,
}

impl ChatService {
    pub fn new(engine: Arc<DialogueEngine>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { engine, sessions }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub async fn create_session(&self, user_id: &str) -> Result<ChatSession> {
        let session = self.sessions.create_session(user_id).await?;
        info!("Created chat session {} for {}", session.session_id, user_id);
        Ok(session)
    }

    /// The user's active session, created on first use.
    pub async fn active_session(&self, user_id: &str) -> Result<ChatSession> {
        match self.sessions.get_active_session(user_id).await? {
            Some(session) => Ok(session),
            None => self.create_session(user_id).await,
        }
    }

    pub async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.require_session(session_id).await?;
        self.sessions.get_history(session_id, limit).await
    }

    /// Run one user message through the engine and persist both sides of the turn.
    pub async fn send_message(&self, session_id: &str, message: &str) -> Result<TurnResult> {
        let session = self.require_session(session_id).await?;
        if message.trim().is_empty() {
            return Err(FitholicError::Validation("Message must not be empty".into()));
        }

        let history = self.sessions.get_history(session_id, HISTORY_LIMIT).await?;
        let profile = self.user_profile(session_id).await?;
        let pending = self.pending(session_id).await?;

        let mut state =
            ConversationState::new(session_id, &session.user_id, message, history, profile);
        if let Some(pending) = pending {
            info!(
                "Resuming {} slot-filling for session {}",
                pending.current_intent.kind.as_str(),
                session_id
            );
            state = state.resume(pending);
        }

        let state = self.engine.run(state).await;
        let result = turn_result(&state);

        self.sessions
            .add_message(session_id, &HistoryEntry::new(Role::User, message))
            .await?;
        let metadata = json!({
            "state": result.current_state,
            "created_exercise": result.created_exercise,
            "generated_workout": result.generated_workout,
        });
        self.sessions
            .add_message(
                session_id,
                &HistoryEntry::new(Role::Assistant, &result.response).with_metadata(metadata),
            )
            .await?;

        match state.pending() {
            Some(pending) => {
                self.sessions
                    .set_context(session_id, DIALOGUE_CONTEXT, &serde_json::to_value(&pending)?)
                    .await?
            }
            None => self.sessions.clear_context(session_id, DIALOGUE_CONTEXT).await?,
        }

        Ok(result)
    }

    async fn require_session(&self, session_id: &str) -> Result<ChatSession> {
        self.sessions
            .get_session(session_id)
            .await?
            .ok_or_else(|| FitholicError::NotFound(format!("Chat session {}", session_id)))
    }

    async fn user_profile(&self, session_id: &str) -> Result<Map<String, Value>> {
        Ok(
            match self.sessions.get_context(session_id, PROFILE_CONTEXT).await? {
                Some(Value::Object(profile)) => profile,
                _ => Map::new(),
            },
        )
    }

    /// A stored pending dialogue; an unreadable blob is dropped.
    async fn pending(&self, session_id: &str) -> Result<Option<PendingDialogue>> {
        let Some(raw) = self.sessions.get_context(session_id, DIALOGUE_CONTEXT).await? else {
            return Ok(None);
        };
        match serde_json::from_value(raw) {
            Ok(pending) => Ok(Some(pending)),
            Err(e) => {
                warn!("Discarding unreadable dialogue context for {}: {}", session_id, e);
                self.sessions.clear_context(session_id, DIALOGUE_CONTEXT).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::ChatState;
    use crate::memory::InMemorySessionStore;
    use crate::store::InMemoryWorkoutStore;
    use crate::testing::{FakeExerciseGenerator, FakeWorkoutGenerator, ScriptedProvider};

    fn service(provider: &Arc<ScriptedProvider>) -> ChatService {
        let store = Arc::new(InMemoryWorkoutStore::new());
        let engine = DialogueEngine::new(
            provider.client(),
            FakeExerciseGenerator::ok(),
            FakeWorkoutGenerator::new(store.clone(), false),
            store,
        );
        ChatService::new(Arc::new(engine), Arc::new(InMemorySessionStore::new()))
    }

    #[tokio::test]
    async fn pending_intent_survives_between_messages() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"{"type": "create_exercise", "confidence": 0.9, "parameters": {}}"#,
        )]);
        let chat = service(&provider);
        let session = chat.active_session("u1").await.unwrap();

        let first = chat
            .send_message(&session.session_id, "create a new exercise")
            .await
            .unwrap();
        assert_eq!(first.current_state, ChatState::GatheringRequirements);
        assert!(
            chat.sessions()
                .get_context(&session.session_id, DIALOGUE_CONTEXT)
                .await
                .unwrap()
                .is_some()
        );

        let second = chat
            .send_message(&session.session_id, "strength exercise for chest")
            .await
            .unwrap();
        assert_eq!(second.current_state, ChatState::ExerciseCreated);
        assert!(
            chat.sessions()
                .get_context(&session.session_id, DIALOGUE_CONTEXT)
                .await
                .unwrap()
                .is_none()
        );

        let history = chat.history(&session.session_id, 10).await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::User);
        let meta = history[3].metadata.as_ref().unwrap();
        assert_eq!(meta["state"], "exercise_created");
        assert!(meta["created_exercise"].is_object());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let provider = ScriptedProvider::new(vec![]);
        let chat = service(&provider);
        let err = chat.send_message("nope", "hi").await.unwrap_err();
        assert!(matches!(err, FitholicError::NotFound(_)));
    }

    #[tokio::test]
    async fn active_session_is_reused() {
        let provider = ScriptedProvider::new(vec![]);
        let chat = service(&provider);
        let a = chat.active_session("u1").await.unwrap();
        let b = chat.active_session("u1").await.unwrap();
        assert_eq!(a.session_id, b.session_id);
    }
}
