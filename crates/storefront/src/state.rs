//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use zallshop_core::StorageError;

use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::services::CartRegistry;
use crate::storage::{FileLocalStore, LocalStore, MemoryLocalStore};

/// Live carts untouched for this long are dropped from memory.
const CART_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog client, the cart registry and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    carts: CartRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Carts persist to files under `config.storage_dir` when set, and to
    /// process memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the storage directory cannot be created.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorageError> {
        let store: Arc<dyn LocalStore> = match &config.storage_dir {
            Some(dir) => {
                tracing::info!(path = %dir.display(), "Using file-backed cart storage");
                Arc::new(FileLocalStore::open(dir)?)
            }
            None => {
                tracing::info!("Using in-memory cart storage");
                Arc::new(MemoryLocalStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Create a new application state persisting carts to `store`.
    #[must_use]
    pub fn with_store(config: StorefrontConfig, store: Arc<dyn LocalStore>) -> Self {
        let catalog = CatalogClient::new(&config.catalog);
        let carts = CartRegistry::new(store, CART_IDLE_TIMEOUT);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog API client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the cart registry.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry {
        &self.inner.carts
    }
}
