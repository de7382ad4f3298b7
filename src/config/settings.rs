//! Application settings and Telegram configuration.

use std::path::PathBuf;

use crate::biorhythm::BiorhythmScale;
use crate::state::StorageBackend;

/// Default JSON snapshot file.
pub const DEFAULT_JSON_PATH: &str = "liferhythm_data.json";

/// Default SQLite database file.
pub const DEFAULT_SQLITE_PATH: &str = "liferhythm.db";

/// Longest message text Telegram accepts.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Telegram Bot API configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Token issued by @BotFather.
    pub bot_token: String,
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub const fn new(bot_token: String) -> Self {
        Self { bot_token }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        Ok(Self::new(bot_token.trim().to_owned()))
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Path to the content JSON file.
    pub content_path: PathBuf,

    /// Where user state is kept.
    pub storage: StorageBackend,

    /// Users allowed to run admin commands.
    pub admin_ids: Vec<i64>,

    /// Maximum characters per outgoing message.
    pub chunk_limit: usize,

    pub biorhythm_scale: BiorhythmScale,

    /// Minimum interval between outgoing messages in milliseconds.
    pub send_interval_ms: u64,
}

fn default_content_path() -> PathBuf {
    PathBuf::from("content.json")
}

fn default_chunk_limit() -> usize {
    3800 // stays below Telegram's 4096 character cap
}

fn default_send_interval() -> u64 {
    50
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            content_path: default_content_path(),
            storage: StorageBackend::Json(PathBuf::from(DEFAULT_JSON_PATH)),
            admin_ids: Vec::new(),
            chunk_limit: default_chunk_limit(),
            biorhythm_scale: BiorhythmScale::default(),
            send_interval_ms: default_send_interval(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env_with_defaults() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`BotSettings::from_env_with_defaults`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let data_path = var("DATA_PATH").map(PathBuf::from);
        let storage = match var("STORAGE_BACKEND").map(|b| b.to_lowercase()).as_deref() {
            None | Some("json") => {
                StorageBackend::Json(data_path.unwrap_or_else(|| PathBuf::from(DEFAULT_JSON_PATH)))
            }
            Some("sqlite") => {
                StorageBackend::Sqlite(data_path.unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)))
            }
            Some("memory") => StorageBackend::Memory,
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_owned())),
        };

        let admin_ids = match var("ADMIN_IDS") {
            Some(list) => parse_admin_ids(&list)?,
            None => Vec::new(),
        };

        let biorhythm_scale = match var("BIORHYTHM_SCALE") {
            Some(scale) => scale.parse().map_err(ConfigError::InvalidScale)?,
            None => BiorhythmScale::default(),
        };

        let chunk_limit = parse_number(var("CHUNK_LIMIT"), "CHUNK_LIMIT")?.unwrap_or_else(default_chunk_limit);
        if !(1..=TELEGRAM_MESSAGE_LIMIT).contains(&chunk_limit) {
            return Err(ConfigError::OutOfRange {
                name: "CHUNK_LIMIT",
                value: chunk_limit,
                max: TELEGRAM_MESSAGE_LIMIT,
            });
        }

        Ok(Self {
            content_path: var("CONTENT_PATH").map_or_else(default_content_path, PathBuf::from),
            storage,
            admin_ids,
            chunk_limit,
            biorhythm_scale,
            send_interval_ms: parse_number(var("SEND_INTERVAL_MS"), "SEND_INTERVAL_MS")?
                .unwrap_or_else(default_send_interval),
        })
    }

    /// Whether `user_id` may run admin commands.
    #[must_use]
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

/// Parses a comma-separated list of user ids; blank items are skipped.
fn parse_admin_ids(list: &str) -> Result<Vec<i64>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse()
                .map_err(|_| ConfigError::InvalidAdminId(item.to_owned()))
        })
        .collect()
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, name: &'static str) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| v.parse().map_err(|_| ConfigError::InvalidNumber { name, value: v }))
        .transpose()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid admin id in ADMIN_IDS: '{0}'")]
    InvalidAdminId(String),

    #[error("Unknown STORAGE_BACKEND '{0}' (expected memory, json or sqlite)")]
    UnknownBackend(String),

    #[error("Invalid BIORHYTHM_SCALE: {0}")]
    InvalidScale(String),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be between 1 and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: usize,
        max: usize,
    },
}
