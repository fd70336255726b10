//! Durable key-value store mirroring the workspace collections.
//!
//! Every logical collection lives under its own [`StoreKey`] as a JSON
//! document. Reads fail soft: a missing or malformed entry yields `None` and
//! the caller substitutes the collection default. Writes are fire-and-forget
//! through [`Store::save`], which logs and swallows [`StorageError`]s so the
//! in-memory state stays authoritative.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Fixed keys, one per persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Tabs,
    Pages,
    ContextFiles,
    LibraryFolders,
    ProjectTitle,
    RoleDefinition,
    Frameworks,
    Styles,
    AiConfig,
}

impl StoreKey {
    pub const ALL: [StoreKey; 9] = [
        Self::Tabs,
        Self::Pages,
        Self::ContextFiles,
        Self::LibraryFolders,
        Self::ProjectTitle,
        Self::RoleDefinition,
        Self::Frameworks,
        Self::Styles,
        Self::AiConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tabs => "tabs",
            Self::Pages => "pages",
            Self::ContextFiles => "context_files",
            Self::LibraryFolders => "library_folders",
            Self::ProjectTitle => "project_title",
            Self::RoleDefinition => "role_definition",
            Self::Frameworks => "frameworks",
            Self::Styles => "styles",
            Self::AiConfig => "ai_config",
        }
    }
}

/// Persistence write failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {size} bytes for '{key}' (limit {limit})")]
    QuotaExceeded {
        key: &'static str,
        size: usize,
        limit: usize,
    },

    #[error("failed to encode '{0}': {1}")]
    Encode(&'static str, #[source] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    LockPoisoned,
}

pub struct Store {
    conn: Arc<Mutex<Connection>>,
    quota_bytes: Option<usize>,
}

impl Store {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Store path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened store at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            quota_bytes: None,
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "scriptorium")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Self::open(dirs.data_dir().join("workspace.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            quota_bytes: None,
        })
    }

    /// Reject single values larger than `quota_bytes` once encoded.
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    // ============================================================
    // Reads
    // ============================================================

    /// Raw stored text for a key. Read failures are logged and reported as absent.
    pub fn load_text(&self, key: StoreKey) -> Option<String> {
        let result = self.lock().and_then(|conn| {
            conn.query_row(
                "SELECT value FROM kv_entries WHERE key = ?",
                [key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(StorageError::from)
        });

        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read '{}', using default: {}", key.as_str(), e);
                None
            }
        }
    }

    /// Decode a JSON collection. Missing or malformed entries yield `None`.
    pub fn load<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let raw = self.load_text(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Malformed data under '{}', using default: {}", key.as_str(), e);
                None
            }
        }
    }

    pub fn load_or_else<T: DeserializeOwned>(&self, key: StoreKey, default: impl FnOnce() -> T) -> T {
        self.load(key).unwrap_or_else(default)
    }

    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM kv_entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    // ============================================================
    // Writes
    // ============================================================

    pub fn try_save_text(&self, key: StoreKey, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota_bytes {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.as_str(),
                    size: value.len(),
                    limit,
                });
            }
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at, size_bytes) VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                size_bytes = excluded.size_bytes",
            (key.as_str(), value, Utc::now().to_rfc3339(), value.len() as i64),
        )?;
        Ok(())
    }

    pub fn try_save<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> Result<(), StorageError> {
        let encoded =
            serde_json::to_string(value).map_err(|e| StorageError::Encode(key.as_str(), e))?;
        self.try_save_text(key, &encoded)
    }

    /// Fire-and-forget write. Failures are logged and otherwise ignored.
    pub fn save<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) {
        if let Err(e) = self.try_save(key, value) {
            tracing::warn!("Keeping '{}' in memory only: {}", key.as_str(), e);
        }
    }

    pub fn save_text(&self, key: StoreKey, value: &str) {
        if let Err(e) = self.try_save_text(key, value) {
            tracing::warn!("Keeping '{}' in memory only: {}", key.as_str(), e);
        }
    }

    pub fn remove(&self, key: StoreKey) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM kv_entries WHERE key = ?", [key.as_str()])?;
        Ok(rows > 0)
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            quota_bytes: self.quota_bytes,
        }
    }
}
