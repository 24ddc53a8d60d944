//! Persistence seam for cart state.
//!
//! The store writes one record under a fixed namespace key. The record
//! layout is a versioned envelope:
//!
//! ```text
//! {"state":{"items":[{"product":{...},"quantity":2}]},"version":0}
//! ```
//!
//! Decimals are written as strings, so a saved state loads back equal to
//! what was saved.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CartState;

/// Key the cart record is stored under.
pub const NAMESPACE_KEY: &str = "zallshop-cart";

/// Current version of the persisted envelope.
const RECORD_VERSION: u32 = 0;

/// Errors that can occur reading or writing the persisted cart.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store failed to read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store rejected the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// The record was written by a newer, incompatible version.
    #[error("Unsupported cart record version {0}")]
    UnsupportedVersion(u32),
}

/// Scoped key-value persistence consumed by [`super::CartStore`].
///
/// Uses `&self` for all methods; implementations use interior mutability.
pub trait CartStorage: Send + Sync {
    /// Load the state stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the record is unreadable.
    fn load(&self, key: &str) -> Result<Option<CartState>, StorageError>;

    /// Replace the state stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be encoded or written.
    fn save(&self, key: &str, state: &CartState) -> Result<(), StorageError>;
}

impl<T: CartStorage + ?Sized> CartStorage for Arc<T> {
    fn load(&self, key: &str) -> Result<Option<CartState>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, state: &CartState) -> Result<(), StorageError> {
        (**self).save(key, state)
    }
}

/// Versioned envelope around the persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCart {
    pub state: CartState,
    pub version: u32,
}

impl PersistedCart {
    /// Encode a state as a persisted record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode(state: &CartState) -> Result<String, StorageError> {
        let record = Self {
            state: state.clone(),
            version: RECORD_VERSION,
        };
        Ok(serde_json::to_string(&record)?)
    }

    /// Decode a persisted record back into a state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record is malformed or from a newer version.
    pub fn decode(raw: &str) -> Result<CartState, StorageError> {
        let record: Self = serde_json::from_str(raw)?;
        if record.version > RECORD_VERSION {
            return Err(StorageError::UnsupportedVersion(record.version));
        }
        Ok(record.state)
    }
}

/// In-process storage holding encoded records.
///
/// Cheaply cloneable; clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw encoded record under `key`, if any.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store a raw record, bypassing encoding.
    pub fn put_raw(&self, key: &str, raw: impl Into<String>) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), raw.into());
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<CartState>, StorageError> {
        self.raw(key).map(|raw| PersistedCart::decode(&raw)).transpose()
    }

    fn save(&self, key: &str, state: &CartState) -> Result<(), StorageError> {
        let raw = PersistedCart::encode(state)?;
        self.put_raw(key, raw);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::CartItem;
    use super::super::fixtures::product;
    use super::*;

    #[test]
    fn test_load_missing_key_is_none() {
        let storage = MemoryStorage::new();
        assert!(storage.load(NAMESPACE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let storage = MemoryStorage::new();
        let mut discounted = product(1, 100, 10);
        discounted.price = rust_decimal::Decimal::new(149_985, 1);
        let state = CartState {
            items: vec![
                CartItem { product: discounted, quantity: 2 },
                CartItem { product: product(2, 50, 0), quantity: 1 },
            ],
        };

        storage.save(NAMESPACE_KEY, &state).unwrap();
        assert_eq!(storage.load(NAMESPACE_KEY).unwrap(), Some(state));
    }

    #[test]
    fn test_round_trip_empty_state() {
        let storage = MemoryStorage::new();
        storage.save(NAMESPACE_KEY, &CartState::new()).unwrap();
        assert_eq!(storage.load(NAMESPACE_KEY).unwrap(), Some(CartState::new()));
    }

    #[test]
    fn test_record_layout() {
        let state = CartState {
            items: vec![CartItem { product: product(3, 20, 5), quantity: 4 }],
        };
        let raw = PersistedCart::encode(&state).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["items"][0]["quantity"], 4);
        assert_eq!(value["state"]["items"][0]["product"]["id"], 3);
        assert_eq!(value["state"]["items"][0]["product"]["price"], "20");
        assert_eq!(
            value["state"]["items"][0]["product"]["discountPercentage"],
            "5"
        );
    }

    #[test]
    fn test_decode_rejects_newer_version() {
        let raw = r#"{"state":{"items":[]},"version":7}"#;
        let err = PersistedCart::decode(raw).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let storage = MemoryStorage::new();
        storage.put_raw(NAMESPACE_KEY, "not json");
        assert!(matches!(
            storage.load(NAMESPACE_KEY),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_clones_share_records() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.save("k", &CartState::new()).unwrap();
        assert!(other.raw("k").is_some());
    }
}
