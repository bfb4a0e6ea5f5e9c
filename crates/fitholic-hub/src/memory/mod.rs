//! SQLite persistence for chat sessions, workout logs, templates, and exercises.

pub mod sqlite;
pub mod workouts;

pub use sqlite::SqliteStore;
