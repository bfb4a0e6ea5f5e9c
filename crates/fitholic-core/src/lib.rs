//! # Fitholic Core
//!
//! Shared types, traits, the chat dialogue engine and the voice command
//! interpreter for Fitholic. Storage backends, LLM and speech providers live
//! in `fitholic-hub`; this crate only defines the seams they plug into.

pub mod chat;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod generator;
pub mod llm;
pub mod memory;
pub mod message;
pub mod provider;
pub mod retry;
pub mod session;
pub mod speech;
pub mod store;
pub mod tool;
pub mod voice;
pub mod workout;

#[cfg(test)]
pub(crate) mod testing;
