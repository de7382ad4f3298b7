//! Per-user state storage.
//!
//! The dispatcher only sees the [`UserStateStore`] trait. Backends:
//! - [`MemoryStore`]: in-process map, optionally snapshotted to a JSON file
//! - [`SqliteStore`]: `users` and `water` tables in a SQLite database

mod memory;
mod record;
mod sqlite;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

pub use memory::MemoryStore;
pub use record::{
    DATE_FORMAT, MAX_WATER_CHANGE_ML, ParsedProfile, ProfileField, ProfilePatch, ProfileUpdateReport, UserRecord,
    ValidationError, WaterChange, parse_date, split_pairs,
};
pub use sqlite::SqliteStore;

/// Errors raised by state backends.
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to serialize state: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to access state file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StateError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Storage of per-user records.
///
/// Implementations serialize mutations of one user's record; operations on
/// different users do not wait on each other's record.
#[async_trait]
pub trait UserStateStore: Send + Sync {
    /// Returns the stored record, creating and persisting an empty one if absent.
    async fn get_or_create(&self, user_id: i64) -> Result<UserRecord, StateError>;

    /// Merges the set fields of `patch` into the record.
    async fn update_profile(&self, user_id: i64, patch: &ProfilePatch) -> Result<UserRecord, StateError>;

    /// Applies a water change to the bucket for `day` and returns the new total.
    async fn record_water(&self, user_id: i64, change: WaterChange, day: NaiveDate) -> Result<u64, StateError>;

    /// Water total for `day`, 0 when nothing was recorded.
    async fn get_water(&self, user_id: i64, day: NaiveDate) -> Result<u64, StateError>;

    /// Number of stored records.
    async fn user_count(&self) -> Result<usize, StateError>;

    /// Parses raw `key=value` pairs and applies the recognized, valid ones.
    async fn update_profile_fields(
        &self,
        user_id: i64,
        pairs: &[(String, String)],
    ) -> Result<ProfileUpdateReport, StateError> {
        let ParsedProfile {
            patch,
            applied,
            unrecognized,
            rejected,
        } = ProfilePatch::from_pairs(pairs);

        let record = if patch.is_empty() {
            self.get_or_create(user_id).await?
        } else {
            self.update_profile(user_id, &patch).await?
        };

        Ok(ProfileUpdateReport {
            record,
            applied,
            unrecognized,
            rejected,
        })
    }
}

/// Which backend holds user state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process memory only.
    Memory,
    /// Process memory, snapshotted to a JSON file after every change.
    Json(PathBuf),
    /// SQLite database file.
    Sqlite(PathBuf),
}

impl StorageBackend {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Json(_) => "json",
            Self::Sqlite(_) => "sqlite",
        }
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Memory => None,
            Self::Json(path) | Self::Sqlite(path) => Some(path),
        }
    }
}

/// Opens the configured backend.
pub fn open_store(backend: &StorageBackend) -> Result<Arc<dyn UserStateStore>, StateError> {
    let store: Arc<dyn UserStateStore> = match backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Json(path) => Arc::new(MemoryStore::load_or_new(path)?),
        StorageBackend::Sqlite(path) => Arc::new(SqliteStore::open(path)?),
    };
    Ok(store)
}
