use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{KeyValueStore, StorageError};

/// In-process storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
    removals: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a single entry
    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut items) = store.items.write() {
            items.insert(key.to_string(), value.to_string());
        }
        store
    }

    /// Number of `remove_item` calls that actually removed something
    pub fn removals(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.read().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        if items.remove(key).is_some() {
            self.removals.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("token").expect("get"), None);

        store.set_item("token", "abc").expect("set");
        assert_eq!(store.get_item("token").expect("get").as_deref(), Some("abc"));

        store.remove_item("token").expect("remove");
        assert_eq!(store.get_item("token").expect("get"), None);
        assert_eq!(store.removals(), 1);
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let store = MemoryStore::with_item("other", "x");
        store.remove_item("token").expect("remove");
        assert_eq!(store.removals(), 0);
        assert_eq!(store.get_item("other").expect("get").as_deref(), Some("x"));
    }
}
