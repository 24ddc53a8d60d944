//! In-process local store backed by a bounded `moka` cache.

use std::time::Duration;

use moka::sync::Cache;
use zallshop_core::StorageError;

use super::LocalStore;

/// Maximum number of records kept in memory.
const MAX_RECORDS: u64 = 100_000;

/// Records untouched for this long are evicted (30 days).
const IDLE_EXPIRY: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// In-memory local store. Contents are lost on restart.
pub struct MemoryLocalStore {
    records: Cache<(String, String), String>,
}

impl MemoryLocalStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Cache::builder()
                .max_capacity(MAX_RECORDS)
                .time_to_idle(IDLE_EXPIRY)
                .build(),
        }
    }
}

impl Default for MemoryLocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get_item(&self, scope: &str, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.records.get(&(scope.to_string(), key.to_string())))
    }

    fn set_item(&self, scope: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.records
            .insert((scope.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn remove_item(&self, scope: &str, key: &str) -> Result<(), StorageError> {
        self.records.invalidate(&(scope.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let store = MemoryLocalStore::new();
        store.set_item("scope", "key", "value").unwrap();
        assert_eq!(store.get_item("scope", "key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_scopes_are_isolated() {
        let store = MemoryLocalStore::new();
        store.set_item("a", "key", "1").unwrap();
        assert!(store.get_item("b", "key").unwrap().is_none());
    }

    #[test]
    fn test_set_replaces_value() {
        let store = MemoryLocalStore::new();
        store.set_item("a", "key", "1").unwrap();
        store.set_item("a", "key", "2").unwrap();
        assert_eq!(store.get_item("a", "key").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_remove_item() {
        let store = MemoryLocalStore::new();
        store.set_item("a", "key", "1").unwrap();
        store.remove_item("a", "key").unwrap();
        store.remove_item("a", "missing").unwrap();
        assert!(store.get_item("a", "key").unwrap().is_none());
    }
}
