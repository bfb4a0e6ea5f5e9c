//! SQLite-backed persistent store — chat sessions, history and context.
//!
//! The same connection also backs the workout repositories (see `workouts.rs`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use fitholic_core::error::{FitholicError, Result};
use fitholic_core::memory::{ChatSession, SessionStore};
use fitholic_core::message::{HistoryEntry, Role};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS chat_sessions (
        session_id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON chat_sessions(user_id, is_active);

    CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        metadata TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_messages_session ON chat_messages(session_id);

    CREATE TABLE IF NOT EXISTS chat_context (
        session_id TEXT NOT NULL,
        context_type TEXT NOT NULL,
        data TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (session_id, context_type)
    );

    CREATE TABLE IF NOT EXISTS workout_logs (
        log_id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        status TEXT NOT NULL,
        data TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_logs_user_status ON workout_logs(user_id, status);

    CREATE TABLE IF NOT EXISTS workout_templates (
        template_id TEXT PRIMARY KEY,
        data TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS exercises (
        exercise_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        data TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_exercises_name ON exercises(name COLLATE NOCASE);
";

/// SQLite store — persistent chat sessions and workout records.
///
/// Small footprint, no external services.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| FitholicError::Storage(format!("SQLite open error: {}", e)))?;
        Self::init(conn)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FitholicError::Storage(format!("SQLite error: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| FitholicError::Storage(format!("SQLite init error: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| FitholicError::Storage("SQLite connection lock poisoned".into()))
    }
}

pub(crate) fn db_err(e: rusqlite::Error) -> FitholicError {
    FitholicError::Storage(e.to_string())
}

fn parse_time(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatSession> {
    let created_at: String = row.get(3)?;
    Ok(ChatSession {
        session_id: row.get(0)?,
        user_id: row.get(1)?,
        is_active: row.get(2)?,
        created_at: parse_time(&created_at),
    })
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn create_session(&self, user_id: &str) -> Result<ChatSession> {
        let session = ChatSession::new(user_id);
        self.conn()?
            .execute(
                "INSERT INTO chat_sessions (session_id, user_id, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.session_id,
                    session.user_id,
                    session.is_active,
                    session.created_at.to_rfc3339()
                ],
            )
            .map_err(db_err)?;
        Ok(session)
    }

    async fn get_active_session(&self, user_id: &str) -> Result<Option<ChatSession>> {
        self.conn()?
            .query_row(
                "SELECT session_id, user_id, is_active, created_at FROM chat_sessions
                 WHERE user_id = ?1 AND is_active = 1
                 ORDER BY created_at DESC LIMIT 1",
                params![user_id],
                session_from_row,
            )
            .optional()
            .map_err(db_err)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        self.conn()?
            .query_row(
                "SELECT session_id, user_id, is_active, created_at FROM chat_sessions
                 WHERE session_id = ?1",
                params![session_id],
                session_from_row,
            )
            .optional()
            .map_err(db_err)
    }

    async fn get_history(&self, session_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT role, content, metadata, created_at
                 FROM chat_messages WHERE session_id = ?1
                 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![session_id, limit as i64], |row| {
                let role: String = row.get(0)?;
                let metadata: Option<String> = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok(HistoryEntry {
                    role: Role::parse(&role),
                    content: row.get(1)?,
                    metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
                    created_at: parse_time(&created_at),
                })
            })
            .map_err(db_err)?;

        let mut messages = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?;

        // Reverse to get chronological order
        messages.reverse();
        Ok(messages)
    }

    async fn add_message(&self, session_id: &str, entry: &HistoryEntry) -> Result<()> {
        let metadata = entry
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn()?
            .execute(
                "INSERT INTO chat_messages (session_id, role, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    session_id,
                    entry.role.as_str(),
                    entry.content,
                    metadata,
                    entry.created_at.to_rfc3339()
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    async fn get_context(&self, session_id: &str, context_type: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT data FROM chat_context WHERE session_id = ?1 AND context_type = ?2",
                params![session_id, context_type],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(match raw {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        })
    }

    async fn set_context(&self, session_id: &str, context_type: &str, data: &Value) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO chat_context (session_id, context_type, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session_id,
                    context_type,
                    serde_json::to_string(data)?,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    async fn clear_context(&self, session_id: &str, context_type: &str) -> Result<()> {
        self.conn()?
            .execute(
                "DELETE FROM chat_context WHERE session_id = ?1 AND context_type = ?2",
                params![session_id, context_type],
            )
            .map_err(db_err)?;
        Ok(())
    }
}
