//! LifeRhythm Bot - Main Entry Point
//!
//! A Telegram bot that serves wellness content, tracks daily water intake
//! and computes biorhythms.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use liferhythm_bot::commands::CommandHandler;
use liferhythm_bot::config::{BotSettings, TelegramConfig};
use liferhythm_bot::content::ContentStore;
use liferhythm_bot::state::open_store;
use liferhythm_bot::telegram::TelegramBot;

/// Telegram wellness bot.
#[derive(Parser, Debug)]
#[command(name = "liferhythm_bot")]
#[command(about = "Wellness content, water tracking and biorhythms over Telegram")]
#[command(version)]
struct Args {
    /// Path to the content JSON file (overrides CONTENT_PATH).
    #[arg(short, long)]
    content: Option<PathBuf>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write the built-in content set to content.example.json and exit.
    #[arg(long)]
    generate_content: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if args.generate_content {
        return generate_example_content();
    }

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let tg_config = TelegramConfig::from_env().context("Failed to load Telegram configuration from environment")?;

    let mut settings = BotSettings::from_env_with_defaults().context("Failed to load bot settings")?;
    if let Some(path) = args.content {
        settings.content_path = path;
    }

    let content = load_content(&settings.content_path)?;
    content.validate().context("Content validation failed")?;
    info!(
        "Loaded {} topics, {} lab references, {} recipes",
        content.topics.len(),
        content.lab_reference.len(),
        content.recipes.len()
    );

    let store = open_store(&settings.storage).context("Failed to open user state storage")?;
    let users = store.user_count().await.unwrap_or_default();
    match settings.storage.path() {
        Some(path) => info!("Storage backend: {} at {} ({} users)", settings.storage.name(), path.display(), users),
        None => info!("Storage backend: {} ({} users)", settings.storage.name(), users),
    }

    let bot = TelegramBot::new(&tg_config, Duration::from_millis(settings.send_interval_ms));
    let handler = Arc::new(CommandHandler::new(store, Arc::new(content), settings));

    info!("Starting LifeRhythm bot...");
    bot.run(handler).await;
    info!("Shutting down...");

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads content from `path`, or the built-in set when the file does not exist.
fn load_content(path: &Path) -> Result<ContentStore> {
    if !path.exists() {
        warn!("Content file {} not found, using built-in content", path.display());
        return Ok(ContentStore::example());
    }

    ContentStore::load_from_file(path).with_context(|| format!("Failed to load content from {}", path.display()))
}

/// Writes the built-in content set as an editable example file.
fn generate_example_content() -> Result<()> {
    let example = ContentStore::example();
    example.save_to_file("content.example.json")?;

    println!("✓ Example content written to: content.example.json");
    println!("\nTo use this bot:");
    println!("1. Copy content.example.json to content.json and edit it");
    println!("2. Create a .env file with BOT_TOKEN");
    println!("3. Run: liferhythm_bot");

    Ok(())
}
