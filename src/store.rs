// src/store.rs
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const STORE_FILE_NAME: &str = "store.sqlite";
const APP_DATA_DIR: &str = "workout-hub";

// Keys of the persisted entries
pub const COMPLETED_WORKOUTS_KEY: &str = "completedWorkouts";
pub const THEME_KEY: &str = "theme";
pub const LANGUAGE_KEY: &str = "language";
pub const CUSTOM_WORKOUTS_KEY: &str = "customWorkouts";
pub const ACTIVE_SESSION_KEY: &str = "activeSession";

// Custom Error type for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing store file")]
    Io(#[from] std::io::Error),
    #[error("Store read failed for '{key}': {source}")]
    ReadFailed {
        key: String,
        source: rusqlite::Error,
    },
    #[error("Store write failed for '{key}': {source}")]
    WriteFailed {
        key: String,
        source: rusqlite::Error,
    },
    #[error("Failed to encode '{key}' as JSON: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

/// String key to string value persistence, the shape of browser local storage.
pub trait KeyValueStore {
    /// # Errors
    /// Backend failures only; a missing key is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// # Errors
    /// Backend failures.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// # Errors
    /// Backend failures. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Gets the path to the store file within the app's data directory.
/// Creates the directory if it doesn't exist.
pub fn get_store_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir().ok_or(StoreError::DataDir)?;
    let app_dir = data_dir.join(APP_DATA_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(STORE_FILE_NAME))
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (and initializes) the store file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(StoreError::Connection)?;
        Self::init(conn)
    }

    /// Store that lives only as long as the value, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Connection)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(StoreError::Connection)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|source| StoreError::ReadFailed {
                key: key.to_string(),
                source,
            })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|source| StoreError::WriteFailed {
                key: key.to_string(),
                source,
            })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|source| StoreError::WriteFailed {
                key: key.to_string(),
                source,
            })?;
        Ok(())
    }
}

/// Reads and decodes a JSON entry. Absent, unreadable or malformed entries
/// all come back as `None`; the reason is only logged.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            debug!(key, error = %e, "Store read failed, using defaults");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(key, error = %e, "Malformed stored JSON, using defaults");
            None
        }
    }
}

/// Encodes a value as JSON and writes it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &encoded)
}

/// Reads a raw string entry, treating read failures like absence.
pub fn load_raw(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    store.get(key).unwrap_or_else(|e| {
        debug!(key, error = %e, "Store read failed, using defaults");
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() -> Result<(), StoreError> {
        let store = SqliteStore::open_in_memory()?;
        assert_eq!(store.get(THEME_KEY)?, None);

        store.set(THEME_KEY, "dark")?;
        store.set(THEME_KEY, "light")?;
        assert_eq!(store.get(THEME_KEY)?.as_deref(), Some("light"));

        store.remove(THEME_KEY)?;
        store.remove(THEME_KEY)?;
        assert_eq!(store.get(THEME_KEY)?, None);
        Ok(())
    }

    #[test]
    fn test_json_helpers() -> Result<(), StoreError> {
        let store = SqliteStore::open_in_memory()?;
        save_json(&store, LANGUAGE_KEY, &vec![1, 2, 3])?;
        assert_eq!(load_json::<Vec<u32>>(&store, LANGUAGE_KEY), Some(vec![1, 2, 3]));

        store.set(LANGUAGE_KEY, "{broken")?;
        assert_eq!(load_json::<Vec<u32>>(&store, LANGUAGE_KEY), None);
        assert_eq!(load_raw(&store, LANGUAGE_KEY).as_deref(), Some("{broken"));
        assert_eq!(load_raw(&store, ACTIVE_SESSION_KEY), None);
        Ok(())
    }
}
