//! In-memory user state with optional JSON snapshot.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{ProfilePatch, StateError, UserRecord, UserStateStore, WaterChange};

/// On-disk layout of the JSON snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    users: BTreeMap<String, UserRecord>,
}

impl Snapshot {
    /// Loads a snapshot, returns an empty one if the file does not exist.
    fn load(path: &Path) -> Result<Self, StateError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Saves the snapshot, replacing the file atomically.
    fn save(&self, path: &Path) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

type Slot = Arc<Mutex<UserRecord>>;

/// User records held in process memory.
///
/// Each record sits behind its own mutex, so a read-modify-write on one
/// user never blocks another user.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<i64, Slot>>,

    /// JSON file written after every change, if configured.
    snapshot_path: Option<PathBuf>,

    /// Serializes snapshot writes.
    save_lock: Mutex<()>,
}

impl MemoryStore {
    /// Creates an empty store without persistence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a JSON-backed store, loading existing records from `path`.
    pub fn load_or_new(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref();
        let snapshot = Snapshot::load(path)?;

        let mut users = HashMap::with_capacity(snapshot.users.len());
        for (key, record) in snapshot.users {
            match key.parse::<i64>() {
                Ok(id) if id == record.user_id => {
                    users.insert(id, Arc::new(Mutex::new(record)));
                }
                _ => warn!("Skipping snapshot entry with mismatched key '{}'", key),
            }
        }

        info!("Loaded {} user records from {}", users.len(), path.display());

        Ok(Self {
            users: RwLock::new(users),
            snapshot_path: Some(path.to_path_buf()),
            save_lock: Mutex::new(()),
        })
    }

    /// Returns the slot for `user_id`, creating it if needed.
    ///
    /// The flag is true when the record was just created.
    async fn slot(&self, user_id: i64) -> (Slot, bool) {
        if let Some(slot) = self.users.read().await.get(&user_id) {
            return (Arc::clone(slot), false);
        }

        let mut users = self.users.write().await;
        let mut created = false;
        let slot = users.entry(user_id).or_insert_with(|| {
            created = true;
            Arc::new(Mutex::new(UserRecord::new(user_id)))
        });
        (Arc::clone(slot), created)
    }

    /// Applies `change` to a copy of the record of `user_id` and keeps it
    /// only once the snapshot holding the copy is written.
    ///
    /// With a snapshot file, all writers go through the save lock before
    /// taking a record lock.
    async fn commit<T, F>(&self, user_id: i64, change: F) -> Result<T, StateError>
    where
        F: FnOnce(&mut UserRecord) -> Result<T, StateError> + Send,
        T: Send,
    {
        let _save = match &self.snapshot_path {
            Some(_) => Some(self.save_lock.lock().await),
            None => None,
        };

        let (slot, created) = self.slot(user_id).await;
        let mut record = slot.lock().await;

        let mut updated = record.clone();
        let mut result = change(&mut updated);
        if result.is_ok()
            && let Some(path) = &self.snapshot_path
            && let Err(e) = self.save_with(path, user_id, &updated).await
        {
            warn!("Snapshot write failed, change to user {} discarded: {}", user_id, e);
            result = Err(e);
        }

        match result {
            Ok(out) => {
                *record = updated;
                if created {
                    debug!("Created record for user {}", user_id);
                }
                Ok(out)
            }
            Err(e) => {
                if created {
                    self.users.write().await.remove(&user_id);
                }
                Err(e)
            }
        }
    }

    /// Writes the snapshot with `pending` in place of the stored record of `user_id`.
    ///
    /// The caller holds the save lock and the lock of `user_id`'s record.
    /// Other record locks are only ever held by writers that own the save
    /// lock or by readers that hold nothing else.
    async fn save_with(&self, path: &Path, user_id: i64, pending: &UserRecord) -> Result<(), StateError> {
        let slots: Vec<(i64, Slot)> = self
            .users
            .read()
            .await
            .iter()
            .filter(|(id, _)| **id != user_id)
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();

        let mut snapshot = Snapshot::default();
        for (id, slot) in slots {
            snapshot.users.insert(id.to_string(), slot.lock().await.clone());
        }
        snapshot.users.insert(user_id.to_string(), pending.clone());

        snapshot.save(path)?;
        debug!("Saved {} user records to {}", snapshot.users.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl UserStateStore for MemoryStore {
    async fn get_or_create(&self, user_id: i64) -> Result<UserRecord, StateError> {
        let existing = self.users.read().await.get(&user_id).map(Arc::clone);
        if let Some(slot) = existing {
            return Ok(slot.lock().await.clone());
        }

        self.commit(user_id, |record| Ok(record.clone())).await
    }

    async fn update_profile(&self, user_id: i64, patch: &ProfilePatch) -> Result<UserRecord, StateError> {
        self.commit(user_id, |record| {
            record.apply(patch);
            Ok(record.clone())
        })
        .await
    }

    async fn record_water(&self, user_id: i64, change: WaterChange, day: NaiveDate) -> Result<u64, StateError> {
        change.validate()?;
        self.commit(user_id, |record| Ok(record.apply_water(change, day)?))
            .await
    }

    async fn get_water(&self, user_id: i64, day: NaiveDate) -> Result<u64, StateError> {
        let slot = self.users.read().await.get(&user_id).map(Arc::clone);
        match slot {
            Some(slot) => Ok(slot.lock().await.water_on(day)),
            None => Ok(0),
        }
    }

    async fn user_count(&self) -> Result<usize, StateError> {
        Ok(self.users.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_is_empty() {
        let store = MemoryStore::new();
        let record = store.get_or_create(10).await.unwrap();
        assert_eq!(record, UserRecord::new(10));
        assert_eq!(store.user_count().await.unwrap(), 1);

        store.get_or_create(10).await.unwrap();
        assert_eq!(store.user_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_water_add_twice() {
        let store = MemoryStore::new();
        store.record_water(1, WaterChange::Add(250), day()).await.unwrap();
        store.record_water(1, WaterChange::Add(250), day()).await.unwrap();
        assert_eq!(store.get_water(1, day()).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_water_set_then_reset() {
        let store = MemoryStore::new();
        store.record_water(1, WaterChange::Set(1000), day()).await.unwrap();
        store.record_water(1, WaterChange::Reset, day()).await.unwrap();
        assert_eq!(store.get_water(1, day()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_water_unknown_user_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.get_water(99, day()).await.unwrap(), 0);
        assert_eq!(store.user_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negative_water_rejected() {
        let store = MemoryStore::new();
        let err = store.record_water(1, WaterChange::Add(-50), day()).await.unwrap_err();
        assert!(matches!(err, StateError::Validation(_)));
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.record_water(3, WaterChange::Add(10), day()).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get_water(3, day()).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = MemoryStore::load_or_new(&path).unwrap();
            store.record_water(8, WaterChange::Add(300), day()).await.unwrap();
            store
                .update_profile(8, &ProfilePatch::date_of_birth(NaiveDate::from_ymd_opt(1990, 8, 20).unwrap()))
                .await
                .unwrap();
        }

        let reopened = MemoryStore::load_or_new(&path).unwrap();
        let record = reopened.get_or_create(8).await.unwrap();
        assert_eq!(record.water_on(day()), 300);
        assert_eq!(record.date_of_birth, NaiveDate::from_ymd_opt(1990, 8, 20));
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::load_or_new(dir.path().join("missing").join("state.json")).unwrap();

        for _ in 0..2 {
            let err = store.record_water(1, WaterChange::Add(250), day()).await.unwrap_err();
            assert!(matches!(err, StateError::Io(_)));
        }
        assert_eq!(store.get_water(1, day()).await.unwrap(), 0);
        assert_eq!(store.user_count().await.unwrap(), 0);

        assert!(store.update_profile(1, &ProfilePatch::date_of_birth(day())).await.is_err());
        assert!(store.get_or_create(1).await.is_err());
        assert_eq!(store.user_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_to_existing_record_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("data");
        std::fs::create_dir(&sub).unwrap();
        let store = MemoryStore::load_or_new(sub.join("state.json")).unwrap();
        store.record_water(2, WaterChange::Add(300), day()).await.unwrap();

        std::fs::remove_dir_all(&sub).unwrap();
        assert!(store.record_water(2, WaterChange::Add(300), day()).await.is_err());
        assert_eq!(store.get_water(2, day()).await.unwrap(), 300);
    }

    #[tokio::test]
    async fn test_oversized_water_rejected() {
        let store = MemoryStore::new();
        store.record_water(1, WaterChange::Add(100), day()).await.unwrap();
        for _ in 0..2 {
            let err = store.record_water(1, WaterChange::Add(i64::MAX), day()).await.unwrap_err();
            assert!(matches!(err, StateError::Validation(_)));
        }
        assert_eq!(store.get_water(1, day()).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_missing_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::load_or_new(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.user_count().await.unwrap(), 0);
    }
}
