use crate::host::KeyValueStore;
use chrono::Utc;
use eyre::Result;
use rusqlite::{Connection, OptionalExtension, params};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::config::get_app_data_prefix;

/// Durable key-value storage backed by SQLite. Survives restarts.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        Self::open(&prefix.join("states.db"))
    }

    pub fn open(filepath: &Path) -> Result<Self> {
        if let Some(parent) = filepath.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(filepath)?;
        Self::init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_db(&conn)?;
        Ok(Self { conn })
    }

    fn init_db(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME
            );
            ",
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key=?", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, value, Utc::now()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key=?", params![key])?;
        Ok(())
    }
}

/// In-memory storage. Clones share the same entries, which is how a session
/// store outlives one `Reader` across a simulated reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_database_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("states.db");
        assert!(!db_path.exists());
        let _store = SqliteStore::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_sqlite_set_get_remove() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("lectern.last-chapter", "one").unwrap();
        store.set("lectern.last-chapter", "two").unwrap();
        assert_eq!(
            store.get("lectern.last-chapter").unwrap(),
            Some("two".to_string())
        );

        store.remove("lectern.last-chapter").unwrap();
        assert_eq!(store.get("lectern.last-chapter").unwrap(), None);
        assert!(store.remove("never-set").is_ok());
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("states.db");
        {
            let mut store = SqliteStore::open(&db_path).unwrap();
            store.set("k", "v").unwrap();
        }
        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_sqlite_stamps_updated_at() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.set("k", "v").unwrap();
        let stamp: DateTime<Utc> = store
            .conn
            .query_row("SELECT updated_at FROM kv WHERE key='k'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(stamp <= Utc::now());
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let mut store = MemoryStore::new();
        let observer = store.clone();
        store.set("scroll", "120").unwrap();
        assert!(observer.contains("scroll"));
        assert_eq!(observer.get("scroll").unwrap(), Some("120".to_string()));

        observer.clear();
        assert!(store.is_empty());
    }
}
