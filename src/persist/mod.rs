/// Map-backed adapter for tests and ephemeral sessions.
pub mod memory;
/// SQLite-backed adapter.
pub mod sqlite;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

/// Failure reading or writing the key/value store.
#[derive(Debug)]
pub enum PersistError {
    /// SQLite failure.
    Sqlite(rusqlite::Error),
    /// JSON encode/decode failure.
    Serde(serde_json::Error),
    /// Anything else.
    Message(String),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "sqlite error: {e}"),
            Self::Serde(e) => write!(f, "serialization error: {e}"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for PersistError {}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Result alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Durable per-device key/value storage holding JSON values.
pub trait KeyValueStore: Send {
    /// Returns the value stored under `key`, or `None` when never saved.
    fn load(&self, key: &str) -> PersistResult<Option<Value>>;
    /// Replaces the value stored under `key`.
    fn save(&mut self, key: &str, value: &Value) -> PersistResult<()>;
}

/// A stored JSON list decoded one record at a time.
#[derive(Debug)]
pub struct LoadedList<T> {
    /// Records that decoded, in stored order.
    pub items: Vec<T>,
    /// Records present in the list that failed to decode.
    pub skipped: usize,
    /// A value was stored under the key but it was not a list.
    pub not_a_list: bool,
}

impl<T> LoadedList<T> {
    /// True when everything stored under the key decoded.
    pub fn is_intact(&self) -> bool {
        self.skipped == 0 && !self.not_a_list
    }
}

/// Loads the list stored under `key`. Absent keys yield an empty list;
/// undecodable records are logged and skipped.
pub fn load_list<T>(kv: &dyn KeyValueStore, key: &str) -> PersistResult<LoadedList<T>>
where
    T: DeserializeOwned,
{
    let mut loaded = LoadedList {
        items: Vec::new(),
        skipped: 0,
        not_a_list: false,
    };

    match kv.load(key)? {
        None => {}
        Some(Value::Array(entries)) => {
            loaded.items.reserve(entries.len());
            for (index, entry) in entries.into_iter().enumerate() {
                match serde_json::from_value(entry) {
                    Ok(item) => loaded.items.push(item),
                    Err(err) => {
                        warn!(key, index, error = %err, "skipping unreadable record");
                        loaded.skipped += 1;
                    }
                }
            }
        }
        Some(_) => {
            warn!(key, "stored value is not a list");
            loaded.not_a_list = true;
        }
    }

    Ok(loaded)
}

/// Encodes `value` and saves it under `key`.
pub fn save_value<T>(kv: &mut dyn KeyValueStore, key: &str, value: &T) -> PersistResult<()>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_value(value)?;
    kv.save(key, &json)
}
