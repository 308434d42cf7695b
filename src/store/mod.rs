use anyhow::{Context, Result};
use fs_err as fs;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::errors::AdvisorError;
use crate::profile::FarmProfile;

/// Slot name the profile lives under. Same key the web client used in
/// browser local storage, so exported data lines up.
pub const PROFILE_KEY: &str = "farmData";

/// The single current farm profile. Absent until the first `set`; every
/// `set` replaces the previous value wholesale.
pub trait ProfileStore: Send + Sync {
    fn get(&self) -> Result<Option<FarmProfile>>;
    fn set(&self, profile: &FarmProfile) -> Result<()>;
}

pub type DynStore = Box<dyn ProfileStore>;

/// Key/value table on disk, one row per key.
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("open profile store at {}", db_path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("create local_storage table")?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl ProfileStore for SqliteProfileStore {
    fn get(&self) -> Result<Option<FarmProfile>> {
        let raw: Option<String> = self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![PROFILE_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("read farm profile")?;

        match raw {
            None => Ok(None),
            Some(json) => decode(&json).map(Some),
        }
    }

    fn set(&self, profile: &FarmProfile) -> Result<()> {
        profile.validate()?;
        let json = serde_json::to_string(profile)?;
        self.conn
            .lock()
            .execute(
                "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![PROFILE_KEY, json],
            )
            .context("write farm profile")?;
        tracing::debug!(key = PROFILE_KEY, "farm profile saved");
        Ok(())
    }
}

/// Process-local store, gone when the process exits.
#[derive(Default)]
pub struct MemoryProfileStore {
    slot: Mutex<Option<String>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get(&self) -> Result<Option<FarmProfile>> {
        match self.slot.lock().as_deref() {
            None => Ok(None),
            Some(json) => decode(json).map(Some),
        }
    }

    fn set(&self, profile: &FarmProfile) -> Result<()> {
        profile.validate()?;
        // Stored serialized so both stores go through the same codec.
        *self.slot.lock() = Some(serde_json::to_string(profile)?);
        Ok(())
    }
}

fn decode(json: &str) -> Result<FarmProfile> {
    serde_json::from_str(json)
        .map_err(|e| AdvisorError::Store(format!("stored {PROFILE_KEY} is unreadable: {e}")).into())
}
