//! Fitholic CLI — chat with your fitness coach, run voice-style workouts,
//! or serve the REST API.
//!
//! Run `fitholic setup` to get started!

mod setup;

use std::io::{self, Write};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use fitholic_core::config::FitholicConfig;
use fitholic_core::dialogue::{ChatState, TurnResult};
use fitholic_core::workout::WorkoutLog;
use fitholic_hub::api::{ApiState, start_server};
use fitholic_hub::app::Services;

// ─── CLI Definition ────────────────────────────────────────

/// Fitholic — your conversational workout coach 🏋️
#[derive(Parser)]
#[command(name = "fitholic", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// ⚡ Interactive setup wizard — provider, model, API keys
    Setup,

    /// 💬 Chat with the coach: create exercises, plan workouts
    Chat {
        /// User the chat session belongs to
        #[arg(short, long, default_value = "cli")]
        user: String,

        #[command(flatten)]
        overrides: ProviderArgs,
    },

    /// ❓ Send a single message in a fresh session
    Ask {
        /// The message to send
        message: String,

        #[arg(short, long, default_value = "cli")]
        user: String,

        #[command(flatten)]
        overrides: ProviderArgs,
    },

    /// 🏋️ Run a workout with typed voice commands ("logged 10 reps at 135 pounds")
    Workout {
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Template to start from (ignored when a workout is already ongoing)
        #[arg(short, long)]
        template: Option<String>,

        #[command(flatten)]
        overrides: ProviderArgs,
    },

    /// 🌐 Start REST API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Require this key as `Authorization: Bearer <key>`
        #[arg(long, env = "FITHOLIC_API_KEY", hide_env_values = true)]
        server_key: Option<String>,

        #[command(flatten)]
        overrides: ProviderArgs,
    },

    /// ⚙️  Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// 📊 Show configuration status
    Status,

    /// 🐛 Tail the diagnostic log
    Logs {
        /// Number of tail lines to show initially
        #[arg(short, long, default_value_t = 50)]
        lines: usize,
    },
}

/// Chat provider overrides shared by the commands that talk to the model.
#[derive(clap::Args, Default)]
struct ProviderArgs {
    /// Provider (overrides config)
    #[arg(short, long)]
    provider: Option<String>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// API key (overrides config)
    #[arg(short = 'k', long)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Key to set (e.g. provider, model, api_key, tts_api_key, port)
        key: String,
        /// Value to set
        value: String,
    },
    /// Print the config file location
    Path,
    /// Write a default config file
    Init,
}

// ─── Helpers ───────────────────────────────────────────────

fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    let title = format!("    ║        🏋️  Fitholic v{}            ║", version);
    println!();
    println!("{}", "    ╔══════════════════════════════════════╗".cyan());
    println!("{}", title.cyan());
    println!("{}", "    ║   Chat and voice workout coach       ║".cyan());
    println!("{}", "    ╚══════════════════════════════════════╝\n".cyan());
}

/// Saved config with command-line provider overrides applied.
fn resolve_config(overrides: &ProviderArgs) -> anyhow::Result<FitholicConfig> {
    let mut config = FitholicConfig::load(&FitholicConfig::default_path())?;
    if let Some(provider) = &overrides.provider {
        if *provider != config.provider.provider {
            config.provider.api_base = None;
            config.provider.api_key = None;
        }
        config.provider.provider = provider.clone();
    }
    if let Some(model) = &overrides.model {
        config.provider.model = model.clone();
    }
    if let Some(key) = &overrides.api_key {
        config.provider.api_key = Some(key.clone());
    }
    Ok(config)
}

fn spinner(message: &str) -> indicatif::ProgressBar {
    let spinner = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn read_line(prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{} ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn print_turn(result: &TurnResult) {
    println!("\n{} {}", "Coach ›".cyan().bold(), result.response.trim());
    match result.current_state {
        ChatState::ExerciseCreated => {
            if let Some(exercise) = &result.created_exercise {
                println!("  {} {}", "Saved exercise:".dimmed(), exercise.exercise_id.dimmed());
            }
        }
        ChatState::WorkoutGenerated => {
            if let Some(template) = &result.generated_workout {
                println!(
                    "  {} {} {}",
                    "Saved template:".dimmed(),
                    template.template_id.dimmed(),
                    "(start it with `fitholic workout --template <id>`)".dimmed()
                );
            }
        }
        _ => {}
    }
    println!();
}

fn print_progress(log: &WorkoutLog) {
    println!("  {} {}", "Workout:".dimmed(), log.log_id.dimmed());
    for (i, exercise) in log.exercises.iter().enumerate() {
        let progress = exercise.progress();
        let marker = if exercise.completed {
            "✅".to_string()
        } else if Some(i) == log.current_index() {
            "▶".cyan().to_string()
        } else {
            "·".dimmed().to_string()
        };
        println!(
            "   {} {} — {}/{} sets",
            marker, exercise.exercise_id, progress.completed_sets, progress.total_sets
        );
    }
}

// ─── Main ──────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to a daily file; the server also logs to stdout.
    let log_dir = setup::data_dir().join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "fitholic.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let serving = matches!(cli.command, Some(Commands::Serve { .. }));

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fitholic_core=debug,fitholic_hub=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(serving.then(|| tracing_subscriber::fmt::layer()))
        .init();

    match cli.command {
        Some(Commands::Setup) => setup::run_setup()?,

        Some(Commands::Chat { user, overrides }) => run_chat(&user, &overrides).await?,

        Some(Commands::Ask {
            message,
            user,
            overrides,
        }) => run_ask(&user, &message, &overrides).await?,

        Some(Commands::Workout {
            user,
            template,
            overrides,
        }) => run_workout(&user, template.as_deref(), &overrides).await?,

        Some(Commands::Serve {
            host,
            port,
            server_key,
            overrides,
        }) => run_serve(host, port, server_key, &overrides).await?,

        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => setup::run_config_show()?,
            ConfigAction::Set { key, value } => setup::run_config_set(&key, &value)?,
            ConfigAction::Path => println!("{}", FitholicConfig::default_path().display()),
            ConfigAction::Init => setup::run_config_init()?,
        },

        Some(Commands::Status) => run_status()?,

        Some(Commands::Logs { lines }) => run_logs(lines).await?,

        None => {
            print_banner();
            if setup::load_saved_config().is_none() {
                println!("  {} Run `fitholic setup` to get started.", "👋".yellow());
            }
            println!("  {} fitholic --help", "Usage:".dimmed());
            println!();
        }
    }

    Ok(())
}

// ─── Command Handlers ──────────────────────────────────────

async fn run_chat(user: &str, overrides: &ProviderArgs) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;
    let services = Services::from_config(&config)?;
    let mut session = services.chat.active_session(user).await?;

    print_banner();
    println!(
        "  {} {} {} {} {}",
        "Provider:".dimmed(),
        services.provider_name.green(),
        "│".dimmed(),
        "Model:".dimmed(),
        services.model.green()
    );
    println!("  {} {}", "Session:".dimmed(), session.session_id.dimmed());
    println!();
    println!("  {} {}", "Commands:".dimmed(), "/quit /new /history /help".dimmed());
    println!(
        "  {} {}",
        "Try:".dimmed(),
        "\"create a new exercise\" or \"generate a 45 minute strength workout\"".dimmed()
    );
    println!();

    loop {
        let Some(input) = read_line(&"You ›".green().bold().to_string())? else {
            break;
        };
        if input.is_empty() {
            continue;
        }

        match input.as_str() {
            "/quit" | "/exit" | "/q" => {
                println!("{}", "👋 Goodbye!".cyan());
                break;
            }
            "/new" => {
                session = services.chat.create_session(user).await?;
                println!("{} {}", "🆕 New session:".yellow(), session.session_id);
                continue;
            }
            "/history" => {
                for entry in services.chat.history(&session.session_id, 10).await? {
                    println!("  {} {}", format!("{}:", entry.role).dimmed(), entry.content);
                }
                println!();
                continue;
            }
            "/help" => {
                println!("\n{}", "Commands:".bold());
                println!("  /quit     — Exit");
                println!("  /new      — Start a fresh session");
                println!("  /history  — Show the last 10 messages");
                println!("  /help     — Show this help");
                println!();
                continue;
            }
            _ => {}
        }

        let spinner = spinner("🧠 Thinking...");
        let result = services.chat.send_message(&session.session_id, &input).await;
        spinner.finish_and_clear();

        match result {
            Ok(turn) => print_turn(&turn),
            Err(e) => eprintln!("{} {}\n", "Error:".red().bold(), e),
        }
    }

    Ok(())
}

async fn run_ask(user: &str, message: &str, overrides: &ProviderArgs) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;
    let services = Services::from_config(&config)?;
    let session = services.chat.create_session(user).await?;

    match services.chat.send_message(&session.session_id, message).await {
        Ok(turn) => println!("{}", turn.response),
        Err(e) => eprintln!("{}: {}", "Error".red(), e),
    }

    Ok(())
}

async fn run_workout(
    user: &str,
    template: Option<&str>,
    overrides: &ProviderArgs,
) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;
    let services = Services::from_config(&config)?;
    let voice = &services.voice;
    let log = voice.start_session(user, template).await?;

    print_banner();
    print_progress(&log);
    println!();
    println!("  {} {}", "Commands:".dimmed(), "/status /end /quit".dimmed());
    println!("  {} {}", "Say:".dimmed(), "\"help\" for the list of workout commands".dimmed());
    println!();

    loop {
        let Some(input) = read_line(&"You ›".green().bold().to_string())? else {
            break;
        };
        if input.is_empty() {
            continue;
        }

        match input.as_str() {
            "/quit" | "/q" => break,
            "/status" => {
                if let Some(log) = voice.ongoing_log(user).await? {
                    print_progress(&log);
                }
                println!();
                continue;
            }
            "/end" => {
                match voice.end_session(user, None).await {
                    Ok(log) => {
                        println!(
                            "{} {} minutes, {:.0} total volume",
                            "🏁 Workout complete:".green().bold(),
                            log.duration.unwrap_or(0),
                            log.total_volume()
                        );
                        break;
                    }
                    Err(e) => println!("{} {}\n", "Not yet:".yellow(), e),
                }
                continue;
            }
            _ => {}
        }

        let spinner = spinner("🎙️  Processing command...");
        let result = voice.process_text_command(user, &input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n{} {}\n", "Coach ›".cyan().bold(), response.response_text);
                if response.command["type"] == "complete_session"
                    && response.command["result"]["success"] == true
                {
                    break;
                }
            }
            Err(e) => eprintln!("{} {}\n", "Error:".red().bold(), e),
        }
    }

    Ok(())
}

fn run_status() -> anyhow::Result<()> {
    print_banner();

    let config_path = FitholicConfig::default_path();
    let config = FitholicConfig::load(&config_path)?;

    println!("  {} Fitholic v{}", "Version:".dimmed(), env!("CARGO_PKG_VERSION"));
    println!(
        "  {} {} {}",
        "Config:".dimmed(),
        config_path.display(),
        if config_path.exists() {
            "✅".green()
        } else {
            "❌ (run `fitholic setup`)".red()
        }
    );
    println!("  {} {}", "Database:".dimmed(), config.database_path().display());
    println!();

    let check = |ok: bool| if ok { "✅".green() } else { "❌".red() };
    println!("  {}", "Services:".bold());
    println!(
        "    {} chat model {} / {}",
        check(config.provider.provider == "ollama" || config.provider_api_key().is_some()),
        config.provider.provider.green(),
        config.provider.model.green()
    );
    println!(
        "    {} speech-to-text ({})",
        check(config.stt_api_key().is_some()),
        config.speech.stt_model
    );
    println!("    {} text-to-speech (ElevenLabs)", check(config.tts_api_key().is_some()));
    println!(
        "    {} REST API key {}",
        check(FitholicConfig::server_api_key().is_some()),
        "(FITHOLIC_API_KEY; open access when unset)".dimmed()
    );

    println!();
    println!("  {}", "Environment Variables:".bold());
    for var in [
        "OPENAI_API_KEY",
        "GEMINI_API_KEY",
        "GROQ_API_KEY",
        "OPENROUTER_API_KEY",
        "ELEVENLABS_API_KEY",
    ] {
        let status = if std::env::var(var).is_ok() {
            "✅".green()
        } else {
            "·".dimmed()
        };
        println!("    {} {}", status, var);
    }
    println!();

    Ok(())
}

// ─── Serve (REST API) ──────────────────────────────────────

async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    server_key: Option<String>,
    overrides: &ProviderArgs,
) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;
    let services = Services::from_config(&config)?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    print_banner();
    println!("  {} {}", "Mode:".dimmed(), "🌐 REST API Server".green().bold());
    println!("  {} {}", "Provider:".dimmed(), services.provider_name.cyan());
    println!("  {} {}", "Model:".dimmed(), services.model.cyan());
    println!(
        "  {} {}",
        "Voice:".dimmed(),
        match (services.voice.has_speech_input(), services.voice.has_speech_output()) {
            (true, true) => "audio in, audio out".green(),
            (true, false) => "audio in, text out".yellow(),
            (false, _) => "text commands only".yellow(),
        }
    );
    println!(
        "  {} {}",
        "Auth:".dimmed(),
        if server_key.is_some() {
            "API key required".green()
        } else {
            "open".yellow()
        }
    );
    println!(
        "  {} {}",
        "Endpoint:".dimmed(),
        format!("http://{}:{}", host, port).green().bold()
    );
    println!();
    println!("  {}", "Endpoints:".bold());
    println!("    {} — Health check", "GET  /v1/health".cyan());
    println!("    {} — Status and metrics", "GET  /v1/status".cyan());
    println!("    {} — Create chat session", "POST /v1/chat/sessions".cyan());
    println!("    {} — Send message", "POST /v1/chat/sessions/{id}/messages".cyan());
    println!("    {} — Voice command (audio body)", "POST /v1/voice/command".cyan());
    println!("    {} — Voice command (text)", "POST /v1/voice/text".cyan());
    println!("    {} — Start workout", "POST /v1/voice/session/start".cyan());
    println!("    {} — End workout", "POST /v1/voice/session/end".cyan());
    println!();

    let state = ApiState::new(&services, server_key);
    start_server(state, &host, port).await?;

    Ok(())
}

// ─── Logs ──────────────────────────────────────────────────

async fn run_logs(initial_lines: usize) -> anyhow::Result<()> {
    use tokio::fs::File;
    use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

    let log_dir = setup::data_dir().join("logs");
    let log_file = log_dir.join(format!(
        "fitholic.log.{}",
        chrono::Utc::now().format("%Y-%m-%d")
    ));

    if !log_file.exists() {
        println!("{} Log file doesn't exist yet at: {}", "Info:".yellow(), log_file.display());
        return Ok(());
    }

    println!("{}", format!("👀 Tailing Fitholic logs from {}...", log_file.display()).cyan());
    println!("{}", "Press Ctrl+C to exit.".dimmed());
    println!();

    if let Ok(content) = std::fs::read_to_string(&log_file) {
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(initial_lines);
        for line in lines.into_iter().skip(start) {
            println!("{}", colorize_log(line));
        }
    }

    let file = File::open(&log_file).await?;
    let metadata = file.metadata().await?;
    let mut reader = BufReader::new(file);
    reader.seek(std::io::SeekFrom::Start(metadata.len())).await?;

    let mut line_buf = String::new();
    loop {
        line_buf.clear();
        let bytes = reader.read_line(&mut line_buf).await?;
        if bytes == 0 {
            tokio::time::sleep(Duration::from_millis(200)).await;
            continue;
        }

        let trimmed = line_buf.trim_end();
        if !trimmed.is_empty() {
            println!("{}", colorize_log(trimmed));
        }
    }
}

fn colorize_log(line: &str) -> String {
    if line.contains(" ERROR ") {
        line.red().to_string()
    } else if line.contains(" WARN ") {
        line.yellow().to_string()
    } else if line.contains(" INFO ") {
        line.green().to_string()
    } else if line.contains(" DEBUG ") {
        line.blue().to_string()
    } else {
        line.dimmed().to_string()
    }
}
