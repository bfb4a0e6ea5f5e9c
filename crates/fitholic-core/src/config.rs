//! Configuration management for Fitholic.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FitholicError, Result};
use crate::provider::ProviderConfig;
use crate::retry::RetryPolicy;

/// Top-level Fitholic configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FitholicConfig {
    /// Chat LLM used by the dialogue engine and voice interpreter.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Optional separate LLM for exercise/workout generation.
    #[serde(default)]
    pub generation: Option<ProviderConfig>,

    #[serde(default)]
    pub speech: SpeechSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Speech-to-text and text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Whisper API key (falls back to the chat provider key / `OPENAI_API_KEY`).
    pub stt_api_key: Option<String>,
    pub stt_api_base: Option<String>,
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// ElevenLabs API key (falls back to `ELEVENLABS_API_KEY`).
    pub tts_api_key: Option<String>,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_voice_setting")]
    pub stability: f32,
    #[serde(default = "default_voice_setting")]
    pub similarity_boost: f32,
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_tts_model() -> String {
    "eleven_monolingual_v1".to_string()
}

fn default_voice_setting() -> f32 {
    0.75
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            stt_api_key: None,
            stt_api_base: None,
            stt_model: default_stt_model(),
            tts_api_key: None,
            voice_id: default_voice_id(),
            tts_model: default_tts_model(),
            stability: default_voice_setting(),
            similarity_boost: default_voice_setting(),
        }
    }
}

/// REST server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite database path (None = `<data dir>/fitholic.db`).
    pub database: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: None,
        }
    }
}

impl FitholicConfig {
    /// Load config from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| FitholicError::Config(format!("Failed to read config: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| FitholicError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FitholicError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitholic")
            .join("config.toml")
    }

    /// Data directory for the database and log files.
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitholic")
    }

    pub fn database_path(&self) -> PathBuf {
        self.server
            .database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::data_dir().join("fitholic.db"))
    }

    /// Chat provider key, falling back to the provider's environment variable.
    pub fn provider_api_key(&self) -> Option<String> {
        resolve_api_key(&self.provider)
    }

    pub fn stt_api_key(&self) -> Option<String> {
        self.speech
            .stt_api_key
            .clone()
            .or_else(|| env_key("OPENAI_API_KEY"))
            .or_else(|| {
                (self.provider.provider == "openai")
                    .then(|| self.provider.api_key.clone())
                    .flatten()
            })
    }

    pub fn tts_api_key(&self) -> Option<String> {
        self.speech
            .tts_api_key
            .clone()
            .or_else(|| env_key("ELEVENLABS_API_KEY"))
    }

    /// Key protecting the REST API (`FITHOLIC_API_KEY`); None disables auth.
    pub fn server_api_key() -> Option<String> {
        env_key("FITHOLIC_API_KEY")
    }
}

/// The configured key, or the conventional environment variable for the provider.
pub fn resolve_api_key(config: &ProviderConfig) -> Option<String> {
    if let Some(key) = config.api_key.as_ref().filter(|k| !k.is_empty()) {
        return Some(key.clone());
    }
    let var = match config.provider.as_str() {
        "openai" => "OPENAI_API_KEY",
        "gemini" => "GEMINI_API_KEY",
        "groq" => "GROQ_API_KEY",
        "openrouter" => "OPENROUTER_API_KEY",
        _ => return None,
    };
    env_key(var)
}

fn env_key(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}
