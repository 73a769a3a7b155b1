//! Storage module - async key-value store for app state
//!
//! Everything the app persists is a JSON blob under a well-known key,
//! read and written through the same get/set/remove interface.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

/// Keys under which the app state lives.
pub mod keys {
    pub const USERS: &str = "gymfit_users";
    pub const CURRENT_USER: &str = "gymfit_current_user";
    pub const WORKOUTS: &str = "gymfit_treinos";
    pub const CHALLENGES: &str = "gymfit_desafios";
    pub const HISTORY: &str = "gymfit_historico";
}

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond-timestamp record ids, bumped past the previous one so
/// two records created in the same millisecond cannot collide.
pub fn next_id() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let prev = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|prev| prev);
    now.max(prev + 1)
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("erro de armazenamento: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("dados corrompidos no armazenamento: {0}")]
    Json(#[from] serde_json::Error),
}

/// Uniform async get/set/remove over a local key-value store.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Read a JSON list blob; a missing key is an empty list.
pub async fn load_list<T: DeserializeOwned>(
    store: &dyn Storage,
    key: &str,
) -> Result<Vec<T>, StorageError> {
    match store.get_item(key).await? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Overwrite a key with the full list serialized as JSON.
pub async fn save_list<T: Serialize>(
    store: &dyn Storage,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    store.set_item(key, &serde_json::to_string(items)?).await
}

/// SQLite-backed store: one `(key, value)` table, like the
/// AsyncStorage the mobile builds sit on.
pub struct SqliteStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteStore {
    /// Open or create the backing database.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = rusqlite::Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl Storage for SqliteStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(rusqlite::params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get_item("missing").await.unwrap().is_none());

        store.set_item("k", "v1").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v1"));

        store.set_item("k", "v2").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v2"));

        store.remove_item("k").await.unwrap();
        assert!(store.get_item("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gymfit.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();

        assert!(store.get_item("missing").await.unwrap().is_none());
        store.set_item("k", "v1").await.unwrap();
        store.set_item("k", "v2").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v2"));

        store.remove_item("k").await.unwrap();
        assert!(store.get_item("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gymfit.db");
        {
            let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
            store.set_item("k", "kept").await.unwrap();
        }
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn test_next_id_is_strictly_increasing() {
        let first = next_id();
        let second = next_id();
        let third = next_id();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn test_load_list_missing_key_is_empty() {
        let store = MemoryStore::new();
        let items: Vec<String> = load_list(&store, "nothing").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_load_list_rejects_corrupt_json() {
        let store = MemoryStore::new();
        store.set_item("bad", "not json").await.unwrap();
        let result: Result<Vec<String>, _> = load_list(&store, "bad").await;
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[tokio::test]
    async fn test_save_then_load_list() {
        let store = MemoryStore::new();
        let items = vec!["a".to_string(), "b".to_string()];
        save_list(&store, "list", &items).await.unwrap();
        let back: Vec<String> = load_list(&store, "list").await.unwrap();
        assert_eq!(back, items);
    }
}
