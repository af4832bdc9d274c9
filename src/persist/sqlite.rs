//! SQLite-backed key/value adapter.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use super::{KeyValueStore, PersistResult};

/// SQLite implementation of [`crate::persist::KeyValueStore`].
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Lists stored keys in ascending order.
    pub fn keys(&self) -> PersistResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Removes `key`; returns true when something was deleted.
    pub fn remove(&mut self, key: &str) -> PersistResult<bool> {
        let count = self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(count > 0)
    }
}

impl KeyValueStore for SqliteKv {
    fn load(&self, key: &str) -> PersistResult<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&mut self, key: &str, value: &Value) -> PersistResult<()> {
        let payload = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO kv(key, value, updated_ms) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE
             SET value = excluded.value, updated_ms = excluded.updated_ms",
            params![key, payload, now_ms() as i64],
        )?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
