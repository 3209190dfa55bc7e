//! Durable storage for [`UserStatistics`].
//!
//! Every backend stores the same JSON blob. Loading never fails: missing or
//! unreadable data yields the zero-value default.

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::stats::UserStatistics;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Key the blob lives under, shared with the browser version's local storage
pub const STORAGE_KEY: &str = "keyball44_typing_stats";

pub trait StatsStore {
    fn load(&self) -> UserStatistics;
    fn save(&self, stats: &UserStatistics) -> Result<(), StoreError>;
}

impl<S: StatsStore + ?Sized> StatsStore for Box<S> {
    fn load(&self) -> UserStatistics {
        (**self).load()
    }

    fn save(&self, stats: &UserStatistics) -> Result<(), StoreError> {
        (**self).save(stats)
    }
}

pub fn encode(stats: &UserStatistics) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(stats)?)
}

/// Parse a stored blob, falling back to defaults on corrupt data
pub fn decode(data: &str) -> UserStatistics {
    match serde_json::from_str::<UserStatistics>(data) {
        Ok(mut stats) => {
            stats.sanitize();
            stats
        }
        Err(e) => {
            warn!(error = %e, "stored statistics unreadable, starting fresh");
            UserStatistics::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::stats_json_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsStore for JsonFileStore {
    fn load(&self) -> UserStatistics {
        match fs::read_to_string(&self.path) {
            Ok(data) => decode(&data),
            Err(_) => UserStatistics::default(),
        }
    }

    fn save(&self, stats: &UserStatistics) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, encode(stats)?)?;
        Ok(())
    }
}

/// Key/value table in SQLite mirroring browser local storage
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(AppDirs::stats_db_path())
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO local_storage (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

impl StatsStore for SqliteStore {
    fn load(&self) -> UserStatistics {
        match self.get_item(STORAGE_KEY) {
            Ok(Some(data)) => decode(&data),
            Ok(None) => UserStatistics::default(),
            Err(e) => {
                warn!(error = %e, "failed to read statistics from sqlite");
                UserStatistics::default()
            }
        }
    }

    fn save(&self, stats: &UserStatistics) -> Result<(), StoreError> {
        self.set_item(STORAGE_KEY, &encode(stats)?)
    }
}

/// Keeps the blob in memory only (tests, `--no-save`)
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(data: &str) -> Self {
        Self {
            data: RefCell::new(Some(data.to_string())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.data.borrow().clone()
    }
}

impl StatsStore for MemoryStore {
    fn load(&self) -> UserStatistics {
        self.data
            .borrow()
            .as_deref()
            .map(decode)
            .unwrap_or_default()
    }

    fn save(&self, stats: &UserStatistics) -> Result<(), StoreError> {
        *self.data.borrow_mut() = Some(encode(stats)?);
        Ok(())
    }
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    date: String,
    category: &'a str,
    kind: &'static str,
    wpm: u32,
    accuracy: u32,
    duration_secs: u64,
}

/// Write the session history as CSV, oldest first
pub fn export_history_csv<P: AsRef<Path>>(
    stats: &UserStatistics,
    path: P,
) -> Result<usize, StoreError> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in &stats.session_history {
        writer.serialize(HistoryRow {
            date: entry.date.to_rfc3339(),
            category: &entry.category,
            kind: match entry.kind {
                crate::stats::SessionKind::Typing => "typing",
                crate::stats::SessionKind::Lesson => "lesson",
            },
            wpm: entry.wpm,
            accuracy: entry.accuracy,
            duration_secs: entry.duration_seconds,
        })?;
    }
    writer.flush()?;
    Ok(stats.session_history.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SessionResult;
    use crate::stats::SessionKind;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn sample_stats() -> UserStatistics {
        let mut stats = UserStatistics::default();
        stats.record_lesson(1, Some(3));
        stats.record_attempt('f');
        stats.record_attempt('f');
        stats.record_error('f');
        stats.finalize_session(
            &SessionResult {
                wpm: 31,
                accuracy: 97,
                duration_seconds: 42,
            },
            "quotes",
            SessionKind::Typing,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        );
        stats
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::with_path(dir.path().join("nested").join("stats.json"));
        let stats = sample_stats();
        store.save(&stats).unwrap();
        assert_eq!(store.load(), stats);
    }

    #[test]
    fn json_file_missing_or_corrupt_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let store = JsonFileStore::with_path(&path);
        assert_eq!(store.load(), UserStatistics::default());

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(store.load(), UserStatistics::default());
    }

    #[test]
    fn save_load_is_stable() {
        let store = MemoryStore::new();
        store.save(&sample_stats()).unwrap();
        let first = store.raw().unwrap();
        store.save(&store.load()).unwrap();
        store.save(&store.load()).unwrap();
        assert_eq!(store.raw().unwrap(), first);
    }

    #[test]
    fn memory_store_corrupt_defaults() {
        let store = MemoryStore::with_raw("[1, 2, 3]");
        assert_eq!(store.load(), UserStatistics::default());
        assert_eq!(MemoryStore::new().load(), UserStatistics::default());
    }

    #[test]
    fn sqlite_roundtrip_and_overwrite() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.load(), UserStatistics::default());

        let mut stats = sample_stats();
        store.save(&stats).unwrap();
        assert_eq!(store.load(), stats);

        stats.reset();
        store.save(&stats).unwrap();
        assert_eq!(store.load(), UserStatistics::default());
        assert!(store.get_item(STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn sqlite_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.save(&sample_stats()).unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load(), sample_stats());
    }

    #[test]
    fn sqlite_corrupt_blob_defaults() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_item(STORAGE_KEY, "garbage").unwrap();
        assert_eq!(store.load(), UserStatistics::default());
    }

    #[test]
    fn boxed_store_delegates() {
        let store: Box<dyn StatsStore> = Box::new(MemoryStore::new());
        store.save(&sample_stats()).unwrap();
        assert_eq!(store.load(), sample_stats());
    }

    #[test]
    fn export_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let rows = export_history_csv(&sample_stats(), &path).unwrap();
        assert_eq!(rows, 1);
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,category,kind,wpm,accuracy,duration_secs"
        );
        assert!(lines.next().unwrap().ends_with(",quotes,typing,31,97,42"));
    }
}
