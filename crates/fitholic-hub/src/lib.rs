//! # Fitholic Hub
//!
//! Concrete backends for the Fitholic core: OpenAI-compatible chat providers,
//! Whisper speech-to-text, ElevenLabs text-to-speech, LLM-backed exercise and
//! workout generators, SQLite stores, voice workout tools, and the REST API.

pub mod api;
pub mod app;
pub mod generators;
pub mod memory;
pub mod metrics;
pub mod middleware;
pub mod providers;
pub mod tools;

#[cfg(test)]
mod testing;
