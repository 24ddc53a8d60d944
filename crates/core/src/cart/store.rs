//! The cart store: sole owner and writer of a [`CartState`].

use std::fmt;

use super::{CartItem, CartState, CartStorage, CartTotals, NAMESPACE_KEY};
use crate::types::{Product, ProductId};

/// Handle returned by [`CartStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type Listener = Box<dyn Fn(&CartState) + Send + Sync>;

/// Owns the authoritative cart state and persists it after every mutation.
///
/// Mutations are synchronous and never fail. Persistence is best effort: a
/// failed write is logged and the in-memory state stays authoritative.
/// Listeners run after the write, with the new state.
pub struct CartStore<S> {
    state: CartState,
    storage: S,
    key: String,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: usize,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the cart stored under [`NAMESPACE_KEY`].
    #[must_use]
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, NAMESPACE_KEY)
    }

    /// Open the cart stored under `key`.
    ///
    /// A missing record starts an empty cart. So does an unreadable one,
    /// after logging the failure; the next mutation overwrites it.
    #[must_use]
    pub fn open_with_key(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = match storage.load(&key) {
            Ok(Some(state)) => state.normalized(),
            Ok(None) => CartState::new(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to rehydrate cart, starting empty");
                CartState::new()
            }
        };

        Self {
            state,
            storage,
            key,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    /// Current line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.state.items
    }

    /// Borrow the current state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.clone()
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.state.totals()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Quantity held for a product, 0 when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.state.get(product_id).map_or(0, |i| i.quantity)
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Add one unit of `product`.
    ///
    /// Appends a new line with quantity 1, or increments the existing line.
    /// An existing line keeps the snapshot taken when it was first added.
    pub fn add_item(&mut self, product: Product) {
        match self.state.get_mut(product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.state.items.push(CartItem {
                product,
                quantity: 1,
            }),
        }
        self.commit();
    }

    /// Remove the line for `product_id`. Absent ids are a no-op.
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.state.items.retain(|i| i.product_id() != product_id);
        self.commit();
    }

    /// Set the quantity of the line for `product_id`.
    ///
    /// A quantity of zero or below removes the line. Absent ids are a no-op.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }

        if let Some(item) = self.state.get_mut(product_id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        self.commit();
    }

    /// Remove every line.
    pub fn clear_cart(&mut self) {
        self.state.items.clear();
        self.commit();
    }

    /// Register a listener called with the new state after each mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&CartState) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() < before
    }

    fn commit(&self) {
        if let Err(e) = self.storage.save(&self.key, &self.state) {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist cart");
        }
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }
}

impl<S> fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::super::fixtures::product;
    use super::super::{MemoryStorage, StorageError};
    use super::*;

    struct FailingStorage;

    impl CartStorage for FailingStorage {
        fn load(&self, _key: &str) -> Result<Option<CartState>, StorageError> {
            Err(StorageError::Backend("unavailable".to_string()))
        }

        fn save(&self, _key: &str, _state: &CartState) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_add_appends_then_increments() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(1, 100, 0));
        cart.add_item(product(1, 100, 0));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(3, 10, 0));
        cart.add_item(product(1, 10, 0));
        cart.add_item(product(3, 10, 0));
        cart.add_item(product(2, 10, 0));

        let ids: Vec<i64> = cart.items().iter().map(|i| i.product_id().as_i64()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_add_keeps_original_snapshot() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(1, 100, 0));
        cart.add_item(product(1, 120, 0));

        assert_eq!(cart.items()[0].product.price, rust_decimal::Decimal::new(100, 0));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(1, 100, 0));
        let before = cart.snapshot();

        cart.remove_item(ProductId::new(99));
        assert_eq!(cart.snapshot(), before);
    }

    #[test]
    fn test_update_quantity_sets_exact_value() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(1, 100, 0));
        cart.update_quantity(ProductId::new(1), 7);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 7);

        cart.update_quantity(ProductId::new(1), 2);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_update_quantity_non_positive_removes() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(1, 100, 0));
        cart.add_item(product(2, 100, 0));

        cart.update_quantity(ProductId::new(1), 0);
        cart.update_quantity(ProductId::new(2), -5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_absent_is_noop() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.update_quantity(ProductId::new(4), 3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_clamps_to_u32() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(1, 1, 0));
        cart.update_quantity(ProductId::new(1), i64::MAX);
        assert_eq!(cart.quantity_of(ProductId::new(1)), u32::MAX);

        cart.add_item(product(1, 1, 0));
        assert_eq!(cart.quantity_of(ProductId::new(1)), u32::MAX);
    }

    #[test]
    fn test_every_mutation_persists() {
        let storage = MemoryStorage::new();
        let mut cart = CartStore::open(storage.clone());

        cart.add_item(product(1, 100, 10));
        assert_eq!(storage.load(NAMESPACE_KEY).unwrap().unwrap(), cart.snapshot());

        cart.update_quantity(ProductId::new(1), 4);
        assert_eq!(storage.load(NAMESPACE_KEY).unwrap().unwrap(), cart.snapshot());

        cart.clear_cart();
        assert_eq!(storage.load(NAMESPACE_KEY).unwrap().unwrap(), CartState::new());
    }

    #[test]
    fn test_open_rehydrates_previous_state() {
        let storage = MemoryStorage::new();
        {
            let mut cart = CartStore::open(storage.clone());
            cart.add_item(product(1, 100, 0));
            cart.add_item(product(2, 50, 0));
            cart.add_item(product(2, 50, 0));
        }

        let cart = CartStore::open(storage);
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.quantity_of(ProductId::new(2)), 2);
    }

    #[test]
    fn test_open_with_key_isolates_namespaces() {
        let storage = MemoryStorage::new();
        let mut a = CartStore::open_with_key(storage.clone(), "a");
        a.add_item(product(1, 100, 0));

        let b = CartStore::open_with_key(storage, "b");
        assert!(b.is_empty());
    }

    #[test]
    fn test_open_corrupt_record_starts_empty() {
        let storage = MemoryStorage::new();
        storage.put_raw(NAMESPACE_KEY, "{broken");

        let mut cart = CartStore::open(storage.clone());
        assert!(cart.is_empty());

        cart.add_item(product(1, 100, 0));
        assert_eq!(storage.load(NAMESPACE_KEY).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_persistence_keeps_memory_state() {
        let mut cart = CartStore::open(FailingStorage);
        cart.add_item(product(1, 100, 0));
        cart.add_item(product(1, 100, 0));
        assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_listeners_see_new_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last_units = Arc::new(AtomicUsize::new(0));

        let mut cart = CartStore::open(MemoryStorage::new());
        let calls_clone = Arc::clone(&calls);
        let units_clone = Arc::clone(&last_units);
        cart.subscribe(move |state| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            let units = usize::try_from(state.totals().unit_count).unwrap();
            units_clone.store(units, Ordering::SeqCst);
        });

        cart.add_item(product(1, 100, 0));
        cart.add_item(product(1, 100, 0));
        cart.remove_item(ProductId::new(1));

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(last_units.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut cart = CartStore::open(MemoryStorage::new());

        let calls_clone = Arc::clone(&calls);
        let id = cart.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        cart.add_item(product(1, 100, 0));

        assert!(cart.unsubscribe(id));
        assert!(!cart.unsubscribe(id));
        cart.clear_cart();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
