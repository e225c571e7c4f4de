use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

use super::{ForwardedIds, ForwardedStore};
use crate::platform::MessageId;

/// Forwarded ids kept in an embedded SQLite table
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create store directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::run_migrations(&conn)?;
        info!("Store database initialized at: {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS forwarded_messages (
                message_id INTEGER PRIMARY KEY,
                forwarded_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )
        .context("Failed to create forwarded_messages table")?;
        Ok(())
    }

    fn query_ids(conn: &Connection) -> Result<ForwardedIds> {
        let mut stmt = conn
            .prepare("SELECT message_id FROM forwarded_messages")
            .context("Failed to prepare query")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i32>(0))
            .context("Failed to map rows")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to collect rows")?;
        Ok(ids.into_iter().map(MessageId).collect())
    }
}

impl ForwardedStore for SqliteStore {
    fn load(&self) -> ForwardedIds {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        match Self::query_ids(&conn) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to load forwarded ids: {:#}", e);
                ForwardedIds::new()
            }
        }
    }

    fn add(&self, ids: &mut ForwardedIds, id: MessageId) -> Result<()> {
        ids.insert(id);
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT OR IGNORE INTO forwarded_messages (message_id) VALUES (?1)",
            rusqlite::params![id.0],
        )
        .context("Failed to insert forwarded message id")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_on_fresh_database() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_add_and_load() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut ids = store.load();
        store.add(&mut ids, MessageId(10)).unwrap();
        store.add(&mut ids, MessageId(11)).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, ids);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_add_twice_keeps_one_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut ids = ForwardedIds::new();
        store.add(&mut ids, MessageId(5)).unwrap();
        store.add(&mut ids, MessageId(5)).unwrap();
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forwarded.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            let mut ids = ForwardedIds::new();
            store.add(&mut ids, MessageId(99)).unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.load().contains(&MessageId(99)));
    }

    #[test]
    fn test_open_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("forwarded.db");

        let store = SqliteStore::open(&path).unwrap();
        let mut ids = ForwardedIds::new();
        store.add(&mut ids, MessageId(7)).unwrap();

        assert!(path.exists());
        assert!(store.load().contains(&MessageId(7)));
    }
}
