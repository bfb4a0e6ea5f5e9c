//! Interactive setup wizard and config commands.

use colored::*;
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};
use std::path::PathBuf;

use fitholic_core::config::FitholicConfig;
use fitholic_core::provider::ProviderConfig;

/// Provider info for the selection menu.
struct ProviderInfo {
    name: &'static str,
    display: &'static str,
    models: &'static [&'static str],
    key_url: &'static str,
    needs_key: bool,
}

const PROVIDERS: &[ProviderInfo] = &[
    ProviderInfo {
        name: "openai",
        display: "🤖 OpenAI (structured outputs, Whisper on the same key)",
        models: &["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini", "gpt-4.1"],
        key_url: "https://platform.openai.com/api-keys",
        needs_key: true,
    },
    ProviderInfo {
        name: "gemini",
        display: "💎 Google Gemini",
        models: &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.0-flash"],
        key_url: "https://aistudio.google.com/apikey",
        needs_key: true,
    },
    ProviderInfo {
        name: "groq",
        display: "⚡ Groq",
        models: &["llama-3.3-70b-versatile", "llama-3.1-8b-instant"],
        key_url: "https://console.groq.com/keys",
        needs_key: true,
    },
    ProviderInfo {
        name: "openrouter",
        display: "🌐 OpenRouter",
        models: &["openai/gpt-4o-mini", "meta-llama/llama-3.3-70b-instruct"],
        key_url: "https://openrouter.ai/keys",
        needs_key: true,
    },
    ProviderInfo {
        name: "ollama",
        display: "🦙 Ollama (Local, Free, Private)",
        models: &["llama3.2", "llama3.1", "mistral", "gemma2"],
        key_url: "",
        needs_key: false,
    },
];

const SETTABLE_KEYS: &[&str] = &[
    "provider",
    "model",
    "api_key",
    "api_base",
    "stt_api_key",
    "tts_api_key",
    "voice_id",
    "host",
    "port",
    "database",
];

fn optional_secret(theme: &ColorfulTheme, prompt: &str) -> anyhow::Result<Option<String>> {
    let key: String = Password::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?;
    Ok(Some(key.trim().to_string()).filter(|k| !k.is_empty()))
}

/// Run the interactive setup wizard.
pub fn run_setup() -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();

    println!();
    println!("{}", "  ╔════════════════════════════════════════╗".cyan());
    println!("{}", "  ║    🏋️  Fitholic Setup Wizard            ║".cyan());
    println!("{}", "  ╚════════════════════════════════════════╝".cyan());
    println!();

    // Step 1: Choose provider
    println!("  {} {}", "Step 1/4".green().bold(), "Choose your chat model provider:".bold());
    println!();
    let provider_names: Vec<&str> = PROVIDERS.iter().map(|p| p.display).collect();
    let provider_idx = Select::with_theme(&theme)
        .items(&provider_names)
        .default(0)
        .interact()?;
    let provider = &PROVIDERS[provider_idx];
    println!("  {} {}", "Selected:".dimmed(), provider.display.green());

    // Step 2: API key
    println!();
    let api_key = if provider.needs_key {
        println!(
            "  {} {}",
            "Step 2/4".green().bold(),
            format!("Enter your {} API key:", provider.name).bold()
        );
        println!("  {}", format!("Get one at: {}", provider.key_url).dimmed());
        let key = optional_secret(&theme, "  API Key (Press Enter to use the environment)")?;
        if key.is_none() {
            println!(
                "  {}",
                "⚠️  No key entered. The provider's environment variable will be used.".yellow()
            );
        }
        key
    } else {
        println!("  {} {}", "Step 2/4".green().bold(), "No API key needed! (local provider)".bold());
        None
    };

    // Step 3: Model
    println!();
    println!("  {} {}", "Step 3/4".green().bold(), "Choose your chat model:".bold());
    let model_idx = Select::with_theme(&theme)
        .items(provider.models)
        .default(0)
        .interact()?;
    let model = provider.models[model_idx].to_string();

    // Step 4: Speech
    println!();
    println!("  {} {}", "Step 4/4".green().bold(), "Voice keys (optional):".bold());
    println!(
        "  {}",
        "Whisper transcribes workout commands; ElevenLabs speaks the replies.".dimmed()
    );
    let stt_api_key = optional_secret(&theme, "  Whisper (OpenAI) key")?;
    let tts_api_key = optional_secret(&theme, "  ElevenLabs key")?;

    let mut config = load_saved_config().unwrap_or_default();
    let final_api_key = if api_key.is_none() && config.provider.provider == provider.name {
        config.provider.api_key.clone()
    } else {
        api_key
    };
    config.provider = ProviderConfig {
        provider: provider.name.to_string(),
        model: model.clone(),
        api_key: final_api_key,
        ..Default::default()
    };
    if stt_api_key.is_some() {
        config.speech.stt_api_key = stt_api_key;
    }
    if tts_api_key.is_some() {
        config.speech.tts_api_key = tts_api_key;
    }

    let config_path = FitholicConfig::default_path();
    config.save(&config_path)?;

    println!();
    println!("  {} {}", "✅ Config saved:".green().bold(), config_path.display());
    println!("  {} {}", "Provider:".dimmed(), provider.name.green());
    println!("  {} {}", "Model:".dimmed(), model.cyan());
    println!();
    println!("  {} Try `fitholic chat` or `fitholic serve`.", "🚀 Ready!".green().bold());
    println!();

    Ok(())
}

/// Write a default config file if none exists yet.
pub fn run_config_init() -> anyhow::Result<()> {
    let config_path = FitholicConfig::default_path();
    if config_path.exists() {
        println!("  {} {}", "Config already exists:".yellow(), config_path.display());
        return Ok(());
    }
    FitholicConfig::default().save(&config_path)?;
    println!("  {} {}", "✅ Wrote defaults to".green(), config_path.display());
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> anyhow::Result<()> {
    let config_path = FitholicConfig::default_path();
    let mut config = FitholicConfig::load(&config_path).unwrap_or_default();

    match key {
        "provider" => config.provider.provider = value.to_string(),
        "model" => config.provider.model = value.to_string(),
        "api_key" => config.provider.api_key = Some(value.to_string()),
        "api_base" => config.provider.api_base = Some(value.to_string()),
        "stt_api_key" => config.speech.stt_api_key = Some(value.to_string()),
        "tts_api_key" => config.speech.tts_api_key = Some(value.to_string()),
        "voice_id" => config.speech.voice_id = value.to_string(),
        "host" => config.server.host = value.to_string(),
        "port" => match value.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => {
                println!("{} port must be a number, got {}", "Error:".red(), value);
                return Ok(());
            }
        },
        "database" => config.server.database = Some(value.to_string()),
        _ => {
            println!("{} Unknown key: {}", "Error:".red(), key);
            println!("\nAvailable keys:");
            for k in SETTABLE_KEYS {
                println!("  • {}", k.cyan());
            }
            return Ok(());
        }
    }

    config.save(&config_path)?;
    println!(
        "  {} {} = {}",
        "✅ Set".green(),
        key.cyan(),
        if key.contains("key") {
            "••••••••(hidden)".to_string()
        } else {
            value.to_string()
        }
    );

    Ok(())
}

fn secret_state(set: bool) -> ColoredString {
    if set {
        "••••••••(set)".green()
    } else {
        "(not set)".red()
    }
}

pub fn run_config_show() -> anyhow::Result<()> {
    let config_path = FitholicConfig::default_path();

    println!();
    println!("  {} {}", "Config file:".dimmed(), config_path.display());
    println!();

    if !config_path.exists() {
        println!("  {}", "No config yet! Run `fitholic setup` to get started.".yellow());
        return Ok(());
    }

    let config = FitholicConfig::load(&config_path)?;
    let row = |key: &str, value: ColoredString| {
        println!("  {} {} = {}", "│".dimmed(), key.cyan(), value);
    };

    println!("  {}", "┌─ Provider ─────────────────────".dimmed());
    row("provider", config.provider.provider.green());
    row("model", config.provider.model.green());
    row("api_key", secret_state(config.provider_api_key().is_some()));
    if let Some(ref base) = config.provider.api_base {
        row("api_base", base.dimmed());
    }
    if let Some(ref generation) = config.generation {
        println!("  {}", "├─ Generation ───────────────────".dimmed());
        row("provider", generation.provider.green());
        row("model", generation.model.green());
    }
    println!("  {}", "├─ Speech ───────────────────────".dimmed());
    row("stt_model", config.speech.stt_model.green());
    row("stt_api_key", secret_state(config.stt_api_key().is_some()));
    row("voice_id", config.speech.voice_id.green());
    row("tts_api_key", secret_state(config.tts_api_key().is_some()));
    println!("  {}", "├─ Server ───────────────────────".dimmed());
    row("host", config.server.host.green());
    row("port", config.server.port.to_string().yellow());
    row("database", config.database_path().display().to_string().dimmed());
    println!("  {}", "└─ Retry ────────────────────────".dimmed());
    println!(
        "    {} attempts, {}ms base delay, {}s timeout",
        config.retry.max_attempts.to_string().yellow(),
        config.retry.base_delay_ms,
        config.retry.timeout_secs
    );
    println!();

    Ok(())
}

/// The saved config, if the file exists and parses.
pub fn load_saved_config() -> Option<FitholicConfig> {
    let path = FitholicConfig::default_path();
    if path.exists() {
        FitholicConfig::load(&path).ok()
    } else {
        None
    }
}

pub fn data_dir() -> PathBuf {
    let dir = FitholicConfig::data_dir();
    std::fs::create_dir_all(&dir).ok();
    dir
}
