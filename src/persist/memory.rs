//! In-process key/value adapter.

use std::sync::{Arc, Mutex};

use hashbrown::HashMap;
use serde_json::Value;

use super::{KeyValueStore, PersistError, PersistResult};

/// Map-backed [`KeyValueStore`].
///
/// Clones share the same map, so a test can keep one clone to inspect what a
/// store wrote through another, or reopen a store over the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryKv {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys written so far.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// True when nothing was written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKv {
    fn load(&self, key: &str) -> PersistResult<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PersistError::Message("memory kv poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> PersistResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PersistError::Message("memory kv poisoned".to_string()))?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}
