//! Session store trait — chat history & per-session context persistence.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FitholicError, Result};
use crate::message::HistoryEntry;

/// A chat session owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub user_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(user_id: &str) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Session store trait — implement for different storage backends.
///
/// Holds chat history plus typed context blobs keyed by `(session, context_type)`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, user_id: &str) -> Result<ChatSession>;

    /// Most recent active session of a user, if any.
    async fn get_active_session(&self, user_id: &str) -> Result<Option<ChatSession>>;

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>>;

    /// The last `limit` messages, oldest first.
    async fn get_history(&self, session_id: &str, limit: usize) -> Result<Vec<HistoryEntry>>;

    async fn add_message(&self, session_id: &str, entry: &HistoryEntry) -> Result<()>;

    async fn get_context(&self, session_id: &str, context_type: &str) -> Result<Option<Value>>;

    async fn set_context(&self, session_id: &str, context_type: &str, data: &Value) -> Result<()>;

    async fn clear_context(&self, session_id: &str, context_type: &str) -> Result<()>;
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| FitholicError::Storage("in-memory store lock poisoned".into()))
}

/// In-memory store for testing and lightweight usage.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<Vec<ChatSession>>,
    history: Mutex<HashMap<String, Vec<HistoryEntry>>>,
    context: Mutex<HashMap<(String, String), Value>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, user_id: &str) -> Result<ChatSession> {
        let session = ChatSession::new(user_id);
        lock(&self.sessions)?.push(session.clone());
        Ok(session)
    }

    async fn get_active_session(&self, user_id: &str) -> Result<Option<ChatSession>> {
        let sessions = lock(&self.sessions)?;
        Ok(sessions
            .iter()
            .rev()
            .find(|s| s.user_id == user_id && s.is_active)
            .cloned())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        let sessions = lock(&self.sessions)?;
        Ok(sessions.iter().find(|s| s.session_id == session_id).cloned())
    }

    async fn get_history(&self, session_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let store = lock(&self.history)?;
        let messages = store.get(session_id).map(Vec::as_slice).unwrap_or_default();
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn add_message(&self, session_id: &str, entry: &HistoryEntry) -> Result<()> {
        lock(&self.history)?
            .entry(session_id.to_string())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn get_context(&self, session_id: &str, context_type: &str) -> Result<Option<Value>> {
        let store = lock(&self.context)?;
        Ok(store
            .get(&(session_id.to_string(), context_type.to_string()))
            .cloned())
    }

    async fn set_context(&self, session_id: &str, context_type: &str, data: &Value) -> Result<()> {
        lock(&self.context)?.insert(
            (session_id.to_string(), context_type.to_string()),
            data.clone(),
        );
        Ok(())
    }

    async fn clear_context(&self, session_id: &str, context_type: &str) -> Result<()> {
        lock(&self.context)?.remove(&(session_id.to_string(), context_type.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[tokio::test]
    async fn history_is_limited_and_chronological() {
        let store = InMemorySessionStore::new();
        let session = store.create_session("u1").await.unwrap();
        for i in 0..12 {
            store
                .add_message(&session.session_id, &HistoryEntry::new(Role::User, &i.to_string()))
                .await
                .unwrap();
        }

        let history = store.get_history(&session.session_id, 10).await.unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history.first().unwrap().content, "2");
        assert_eq!(history.last().unwrap().content, "11");
    }

    #[tokio::test]
    async fn context_is_keyed_by_type() {
        let store = InMemorySessionStore::new();
        store
            .set_context("s1", "dialogue", &serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert!(store.get_context("s1", "user_profile").await.unwrap().is_none());
        assert!(store.get_context("s1", "dialogue").await.unwrap().is_some());

        store.clear_context("s1", "dialogue").await.unwrap();
        assert!(store.get_context("s1", "dialogue").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn active_session_is_latest_for_user() {
        let store = InMemorySessionStore::new();
        store.create_session("u1").await.unwrap();
        let second = store.create_session("u1").await.unwrap();
        store.create_session("u2").await.unwrap();

        let active = store.get_active_session("u1").await.unwrap().unwrap();
        assert_eq!(active.session_id, second.session_id);
        assert!(store.get_active_session("u3").await.unwrap().is_none());
    }
}
