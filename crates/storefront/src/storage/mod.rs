//! Browser-local key-value storage for carts.
//!
//! Each browser gets its own scope (its [`BrowserId`]), inside which string
//! values live under string keys, the way a page's `localStorage` does. The
//! cart store writes one record per scope under
//! [`zallshop_core::NAMESPACE_KEY`].
//!
//! # Backends
//!
//! - [`MemoryLocalStore`] - bounded in-process store, lost on restart
//! - [`FileLocalStore`] - one JSON file per record, survives restarts

mod file;
mod memory;

pub use file::FileLocalStore;
pub use memory::MemoryLocalStore;

use std::sync::Arc;

use zallshop_core::cart::PersistedCart;
use zallshop_core::{CartState, CartStorage, StorageError};

use crate::models::BrowserId;

/// Scoped string key-value store.
pub trait LocalStore: Send + Sync {
    /// Read the value under `key` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get_item(&self, scope: &str, key: &str) -> Result<Option<String>, StorageError>;

    /// Write the value under `key` in `scope`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set_item(&self, scope: &str, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key` in `scope`. Missing values are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove_item(&self, scope: &str, key: &str) -> Result<(), StorageError>;
}

/// Cart persistence for one browser.
#[derive(Clone)]
pub struct BrowserCartStorage {
    store: Arc<dyn LocalStore>,
    scope: String,
}

impl BrowserCartStorage {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>, browser: &BrowserId) -> Self {
        Self {
            store,
            scope: browser.to_string(),
        }
    }
}

impl CartStorage for BrowserCartStorage {
    fn load(&self, key: &str) -> Result<Option<CartState>, StorageError> {
        self.store
            .get_item(&self.scope, key)?
            .map(|raw| PersistedCart::decode(&raw))
            .transpose()
    }

    fn save(&self, key: &str, state: &CartState) -> Result<(), StorageError> {
        let raw = PersistedCart::encode(state)?;
        self.store.set_item(&self.scope, key, &raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use zallshop_core::{CartStore, NAMESPACE_KEY, ProductId};

    use super::*;
    use crate::test_support::product;

    #[test]
    fn test_browsers_do_not_share_carts() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryLocalStore::new());
        let alice = BrowserId::generate();
        let bob = BrowserId::generate();

        let mut cart = CartStore::open(BrowserCartStorage::new(Arc::clone(&store), &alice));
        cart.add_item(product(1, 100, 0));

        let other = CartStore::open(BrowserCartStorage::new(Arc::clone(&store), &bob));
        assert!(other.is_empty());

        let again = CartStore::open(BrowserCartStorage::new(store, &alice));
        assert_eq!(again.quantity_of(ProductId::new(1)), 1);
    }

    #[test]
    fn test_record_is_written_under_namespace_key() {
        let store = Arc::new(MemoryLocalStore::new());
        let browser = BrowserId::generate();
        let storage = BrowserCartStorage::new(store.clone(), &browser);

        storage.save(NAMESPACE_KEY, &CartState::new()).unwrap();

        let raw = store
            .get_item(&browser.to_string(), NAMESPACE_KEY)
            .unwrap()
            .unwrap();
        assert_eq!(raw, r#"{"state":{"items":[]},"version":0}"#);
    }
}
