//! Configuration for the LifeRhythm bot.
//!
//! Settings come from environment variables (optionally loaded from a
//! `.env` file by the binary) with defaults for everything but the token.

mod settings;

pub use settings::{BotSettings, ConfigError, DEFAULT_JSON_PATH, DEFAULT_SQLITE_PATH, TELEGRAM_MESSAGE_LIMIT, TelegramConfig};
