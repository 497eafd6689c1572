//! Database repository layer
//!
//! Read, write and clear operations for named slots.

use crate::error::{Error, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        super::schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("database connection lock poisoned".to_string()))
    }

    /// Read the raw value stored under `name`, if any
    pub fn read_slot(&self, name: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_slots WHERE name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Replace the value stored under `name`
    ///
    /// The old record is removed and the new one inserted in a single
    /// transaction; values are never merged.
    pub fn write_slot(&self, name: &str, value: &str) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM kv_slots WHERE name = ?1", params![name])?;
        tx.execute(
            "INSERT INTO kv_slots (name, value, updated_at) VALUES (?1, ?2, ?3)",
            params![name, value, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        tracing::debug!(slot = name, bytes = value.len(), "Slot written");
        Ok(())
    }

    /// Remove the value stored under `name`; missing slots are not an error
    pub fn clear_slot(&self, name: &str) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM kv_slots WHERE name = ?1", params![name])?;
        tracing::debug!(slot = name, removed, "Slot cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn test_missing_slot_reads_none() {
        let db = memory_db();
        assert_eq!(db.read_slot("humanitarian_user").unwrap(), None);
    }

    #[test]
    fn test_write_replaces_previous_value() {
        let db = memory_db();
        db.write_slot("slot", "first").unwrap();
        db.write_slot("slot", "second").unwrap();

        assert_eq!(db.read_slot("slot").unwrap().as_deref(), Some("second"));

        let conn = db.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_slots", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let db = memory_db();
        db.write_slot("slot", "value").unwrap();
        db.clear_slot("slot").unwrap();
        db.clear_slot("slot").unwrap();
        assert_eq!(db.read_slot("slot").unwrap(), None);
    }

    #[test]
    fn test_slots_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/skai.db");

        {
            let db = Database::open(&path).unwrap();
            db.migrate().unwrap();
            db.write_slot("slot", "persisted").unwrap();
        }

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        assert_eq!(db.read_slot("slot").unwrap().as_deref(), Some("persisted"));
    }
}
