//! Cart state container.
//!
//! # Invariants
//!
//! - At most one [`CartItem`] per product id.
//! - Every present item has a quantity of at least 1.
//!
//! Both hold after every [`CartStore`] operation, including rehydration from
//! a persisted record.
//!
//! # Example
//!
//! ```rust
//! use zallshop_core::cart::{CartStore, MemoryStorage};
//! # use zallshop_core::{Product, ProductId};
//! # use rust_decimal::Decimal;
//! # let product = Product {
//! #     id: ProductId::new(1), title: "Mascara".into(), description: String::new(),
//! #     price: Decimal::new(150_000, 0), discount_percentage: Decimal::ZERO, rating: 4.5,
//! #     stock: 3, brand: None, category: "beauty".into(), thumbnail: String::new(),
//! #     images: Vec::new(), tags: None,
//! # };
//!
//! let mut cart = CartStore::open(MemoryStorage::new());
//! cart.add_item(product.clone());
//! cart.add_item(product);
//! assert_eq!(cart.totals().unit_count, 2);
//! ```

mod storage;
mod store;
mod totals;

pub use storage::{CartStorage, MemoryStorage, NAMESPACE_KEY, PersistedCart, StorageError};
pub use store::{CartStore, ListenerId};
pub use totals::{CartTotals, effective_unit_price};

use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// A line item: a product snapshot plus a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Id of the product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }
}

/// The ordered collection of line items.
///
/// Insertion order is kept for display only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl CartState {
    /// Create an empty cart state.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id() == product_id)
    }

    fn get_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.product_id() == product_id)
    }

    /// Totals derived from the current items.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::compute(&self.items)
    }

    /// Restore the invariants on state that did not come from a [`CartStore`].
    ///
    /// Zero-quantity lines are dropped. Repeated product ids are merged into
    /// the first occurrence, summing quantities.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut out = Self::new();
        for item in self.items {
            if item.quantity == 0 {
                continue;
            }
            match out.get_mut(item.product_id()) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => out.items.push(item),
            }
        }
        out
    }
}
