//! SQLite-backed user state.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};

use super::{DATE_FORMAT, ProfilePatch, StateError, UserRecord, UserStateStore, WaterChange, parse_date};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        tg_id INTEGER PRIMARY KEY,
        display_name TEXT,
        username TEXT,
        sex TEXT,
        age INTEGER,
        height_cm REAL,
        weight_kg REAL,
        goal TEXT,
        dob TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS water (
        tg_id INTEGER NOT NULL,
        day TEXT NOT NULL,
        amount_ml INTEGER NOT NULL CHECK (amount_ml >= 0),
        PRIMARY KEY (tg_id, day)
    );
";

/// Adds columns that databases created by older releases lack.
fn migrate(conn: &Connection) -> Result<(), StateError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('users')")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if !columns.iter().any(|c| c == "username") {
        conn.execute_batch("ALTER TABLE users ADD COLUMN username TEXT")?;
        info!("Added users.username column");
    }
    Ok(())
}

/// User state in a SQLite database.
///
/// Every operation runs in its own transaction on a single connection,
/// on tokio's blocking pool; water changes are a single UPSERT.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self::with_connection(conn)?;
        info!("SQLite state store opened: {}", path.display());
        Ok(store)
    }

    /// Opens a private in-memory database.
    #[cfg(test)]
    fn open_in_memory() -> Result<Self, StateError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StateError> {
        conn.execute_batch(SCHEMA)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` on the connection in tokio's blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StateError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StateError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StateError::Storage("connection mutex poisoned".to_owned()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StateError::Storage(format!("database task failed: {e}")))?
    }

    /// Reads a full record inside an open connection or transaction.
    fn load(conn: &Connection, user_id: i64) -> Result<Option<UserRecord>, StateError> {
        let row = conn
            .query_row(
                "SELECT display_name, username, sex, age, height_cm, weight_kg, goal, dob FROM users WHERE tg_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<u32>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, Option<String>>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((display_name, username, sex, age, height_cm, weight_kg, goal, dob)) = row else {
            return Ok(None);
        };

        let date_of_birth = dob.as_deref().and_then(|text| match parse_date(text) {
            Ok(date) => Some(date),
            Err(e) => {
                warn!("Ignoring stored date of birth for user {}: {}", user_id, e);
                None
            }
        });

        let mut water_by_day = BTreeMap::new();
        let mut stmt = conn.prepare("SELECT day, amount_ml FROM water WHERE tg_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (day, amount) = row?;
            match (parse_date(&day), u64::try_from(amount)) {
                (Ok(day), Ok(amount)) => {
                    water_by_day.insert(day, amount);
                }
                _ => warn!("Ignoring malformed water row for user {}: {} = {}", user_id, day, amount),
            }
        }

        Ok(Some(UserRecord {
            user_id,
            display_name,
            username,
            sex,
            age,
            height_cm,
            weight_kg,
            goal,
            date_of_birth,
            water_by_day,
        }))
    }

    fn ensure_user(conn: &Connection, user_id: i64) -> Result<(), StateError> {
        conn.execute("INSERT OR IGNORE INTO users (tg_id) VALUES (?1)", params![user_id])?;
        Ok(())
    }

    fn load_existing(conn: &Connection, user_id: i64) -> Result<UserRecord, StateError> {
        Self::load(conn, user_id)?
            .ok_or_else(|| StateError::Storage(format!("user {user_id} vanished during update")))
    }
}

fn sql_amount(ml: u64) -> Result<i64, StateError> {
    i64::try_from(ml).map_err(|_| StateError::Storage(format!("water amount out of range: {ml}")))
}

#[async_trait]
impl UserStateStore for SqliteStore {
    async fn get_or_create(&self, user_id: i64) -> Result<UserRecord, StateError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            Self::ensure_user(&tx, user_id)?;
            let record = Self::load_existing(&tx, user_id)?;
            tx.commit()?;
            Ok(record)
        })
        .await
    }

    async fn update_profile(&self, user_id: i64, patch: &ProfilePatch) -> Result<UserRecord, StateError> {
        let patch = patch.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            Self::ensure_user(&tx, user_id)?;

            // COALESCE keeps the stored value wherever the patch has none.
            tx.execute(
                "UPDATE users SET
                    display_name = COALESCE(?2, display_name),
                    username = COALESCE(?3, username),
                    sex = COALESCE(?4, sex),
                    age = COALESCE(?5, age),
                    height_cm = COALESCE(?6, height_cm),
                    weight_kg = COALESCE(?7, weight_kg),
                    goal = COALESCE(?8, goal),
                    dob = COALESCE(?9, dob)
                 WHERE tg_id = ?1",
                params![
                    user_id,
                    patch.display_name,
                    patch.username,
                    patch.sex,
                    patch.age,
                    patch.height_cm,
                    patch.weight_kg,
                    patch.goal,
                    patch.date_of_birth.map(|d| d.format(DATE_FORMAT).to_string()),
                ],
            )?;

            let record = Self::load_existing(&tx, user_id)?;
            tx.commit()?;
            Ok(record)
        })
        .await
    }

    async fn record_water(&self, user_id: i64, change: WaterChange, day: NaiveDate) -> Result<u64, StateError> {
        change.validate()?;
        let day_key = day.format(DATE_FORMAT).to_string();
        let amount = sql_amount(change.resolve(0))?;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            Self::ensure_user(&tx, user_id)?;

            let sql = match change {
                WaterChange::Add(_) => {
                    "INSERT INTO water (tg_id, day, amount_ml) VALUES (?1, ?2, ?3)
                     ON CONFLICT (tg_id, day) DO UPDATE SET amount_ml = amount_ml + excluded.amount_ml"
                }
                WaterChange::Set(_) | WaterChange::Reset => {
                    "INSERT INTO water (tg_id, day, amount_ml) VALUES (?1, ?2, ?3)
                     ON CONFLICT (tg_id, day) DO UPDATE SET amount_ml = excluded.amount_ml"
                }
            };
            tx.execute(sql, params![user_id, day_key, amount])?;

            let total: i64 = tx.query_row(
                "SELECT amount_ml FROM water WHERE tg_id = ?1 AND day = ?2",
                params![user_id, day_key],
                |row| row.get(0),
            )?;
            tx.commit()?;

            u64::try_from(total).map_err(|_| StateError::Storage(format!("negative water total stored: {total}")))
        })
        .await
    }

    async fn get_water(&self, user_id: i64, day: NaiveDate) -> Result<u64, StateError> {
        let day_key = day.format(DATE_FORMAT).to_string();
        self.with_conn(move |conn| {
            let total: Option<i64> = conn
                .query_row(
                    "SELECT amount_ml FROM water WHERE tg_id = ?1 AND day = ?2",
                    params![user_id, day_key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(total.and_then(|t| u64::try_from(t).ok()).unwrap_or(0))
        })
        .await
    }

    async fn user_count(&self) -> Result<usize, StateError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ProfileField, ValidationError};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = store.get_or_create(11).await.unwrap();
        assert_eq!(record, UserRecord::new(11));
        store.get_or_create(11).await.unwrap();
        assert_eq!(store.user_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_water_modes() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.record_water(1, WaterChange::Add(250), day()).await.unwrap(), 250);
        assert_eq!(store.record_water(1, WaterChange::Add(250), day()).await.unwrap(), 500);
        assert_eq!(store.get_water(1, day()).await.unwrap(), 500);

        store.record_water(1, WaterChange::Set(1000), day()).await.unwrap();
        store.record_water(1, WaterChange::Reset, day()).await.unwrap();
        assert_eq!(store.get_water(1, day()).await.unwrap(), 0);
        assert_eq!(store.get_water(2, day()).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_busy_connection_does_not_stall_runtime() {
        use std::time::Duration;

        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let conn = Arc::clone(&store.conn);
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let holder = std::thread::spawn(move || {
            let _guard = conn.lock().unwrap();
            locked_tx.send(()).unwrap();
            std::thread::sleep(Duration::from_millis(200));
        });
        locked_rx.recv().unwrap();

        let reader = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.get_water(1, day()).await }
        });

        // The only runtime thread keeps serving timers while the query waits.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!reader.is_finished());

        assert_eq!(reader.await.unwrap().unwrap(), 0);
        holder.join().unwrap();
    }

    #[tokio::test]
    async fn test_negative_water_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.record_water(1, WaterChange::Set(-5), day()).await.unwrap_err();
        assert!(matches!(err, StateError::Validation(_)));
        assert_eq!(store.user_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_water_is_a_validation_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.record_water(1, WaterChange::Add(500), day()).await.unwrap();

        for _ in 0..2 {
            let err = store.record_water(1, WaterChange::Add(i64::MAX), day()).await.unwrap_err();
            assert!(matches!(err, StateError::Validation(ValidationError::AmountTooLarge { .. })));
        }
        assert_eq!(store.get_water(1, day()).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_username_column_added_to_old_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE users (tg_id INTEGER PRIMARY KEY, display_name TEXT, sex TEXT, age INTEGER,
                    height_cm REAL, weight_kg REAL, goal TEXT, dob TEXT, created_at TEXT);
                 INSERT INTO users (tg_id, goal) VALUES (3, 'gain');",
            )
            .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let record = store
            .update_profile(3, &ProfilePatch {
                username: Some("neo".to_owned()),
                ..ProfilePatch::default()
            })
            .await
            .unwrap();
        assert_eq!(record.username.as_deref(), Some("neo"));
        assert_eq!(record.goal.as_deref(), Some("gain"));
    }

    #[tokio::test]
    async fn test_profile_merge() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .update_profile(4, &ProfilePatch {
                goal: Some("loss".to_owned()),
                age: Some(30),
                ..ProfilePatch::default()
            })
            .await
            .unwrap();

        let pairs = vec![
            ("height".to_owned(), "180".to_owned()),
            ("weight".to_owned(), "82.5".to_owned()),
            ("unknownField".to_owned(), "x".to_owned()),
        ];
        let report = store.update_profile_fields(4, &pairs).await.unwrap();

        assert_eq!(report.record.height_cm, Some(180.0));
        assert_eq!(report.record.weight_kg, Some(82.5));
        assert_eq!(report.record.goal.as_deref(), Some("loss"));
        assert_eq!(report.record.age, Some(30));
        assert_eq!(report.unrecognized, vec!["unknownField".to_owned()]);
        assert_eq!(report.applied, vec![ProfileField::Height, ProfileField::Weight]);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        let dob = NaiveDate::from_ymd_opt(1988, 2, 29).unwrap();

        {
            let store = SqliteStore::open(&path).unwrap();
            store.update_profile(9, &ProfilePatch::date_of_birth(dob)).await.unwrap();
            store.record_water(9, WaterChange::Add(750), day()).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let record = store.get_or_create(9).await.unwrap();
        assert_eq!(record.date_of_birth, Some(dob));
        assert_eq!(record.water_on(day()), 750);
    }
}
