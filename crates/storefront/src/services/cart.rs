//! Per-browser cart registry.
//!
//! Each browser has exactly one live [`CartStore`], shared by all of that
//! browser's in-flight requests behind a mutex. Mutations from the same
//! browser are therefore applied one at a time, in arrival order, and each
//! one is persisted before the next starts.
//!
//! Stores idle for longer than the configured period are dropped from memory;
//! the next request rehydrates them from local storage.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use moka::sync::Cache;
use zallshop_core::{CartState, CartStore};

use crate::error::add_breadcrumb;
use crate::models::BrowserId;
use crate::storage::{BrowserCartStorage, LocalStore};

/// A browser's cart store, shared between that browser's requests.
pub type SharedCart = Arc<Mutex<CartStore<BrowserCartStorage>>>;

/// Maximum number of carts held in memory at once.
const MAX_LIVE_CARTS: u64 = 10_000;

/// Registry of live cart stores, keyed by browser.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct CartRegistry {
    inner: Arc<CartRegistryInner>,
}

struct CartRegistryInner {
    store: Arc<dyn LocalStore>,
    carts: Cache<BrowserId, SharedCart>,
}

impl CartRegistry {
    /// Create a registry persisting carts to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>, idle_timeout: Duration) -> Self {
        let carts = Cache::builder()
            .max_capacity(MAX_LIVE_CARTS)
            .time_to_idle(idle_timeout)
            .build();

        Self {
            inner: Arc::new(CartRegistryInner { store, carts }),
        }
    }

    /// Get the browser's cart store, rehydrating it on first use.
    #[must_use]
    pub fn open(&self, browser: BrowserId) -> SharedCart {
        self.inner.carts.get_with(browser, || {
            let storage = BrowserCartStorage::new(Arc::clone(&self.inner.store), &browser);
            let mut cart = CartStore::open(storage);
            tracing::debug!(browser_id = %browser, lines = cart.items().len(), "Cart rehydrated");

            cart.subscribe(move |state: &CartState| {
                let lines = state.len().to_string();
                let units = state.totals().unit_count.to_string();
                tracing::debug!(browser_id = %browser, %lines, %units, "Cart changed");
                add_breadcrumb(
                    "cart",
                    "Cart changed",
                    Some(&[("lines", lines.as_str()), ("units", units.as_str())]),
                );
            });

            Arc::new(Mutex::new(cart))
        })
    }

    /// Run `f` with exclusive access to the browser's cart.
    ///
    /// Never call this across an `.await`: the closure is synchronous and the
    /// lock is released when it returns.
    pub fn with_cart<R>(
        &self,
        browser: BrowserId,
        f: impl FnOnce(&mut CartStore<BrowserCartStorage>) -> R,
    ) -> R {
        let cart = self.open(browser);
        let mut guard = cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Copy of the browser's current cart state.
    #[must_use]
    pub fn snapshot(&self, browser: BrowserId) -> CartState {
        self.with_cart(browser, |cart| cart.snapshot())
    }
}
