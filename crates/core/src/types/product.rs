//! Catalog data as the storefront sees it.
//!
//! Field names serialize in camelCase, matching both the upstream catalog
//! payloads and the persisted cart record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A catalog product.
///
/// Read-only from the cart's point of view: a cart line keeps its own copy
/// taken when the product was added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Unit price in the display currency.
    pub price: Decimal,
    /// Percentage off the unit price, 0-100.
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub stock: u32,
    /// Some catalog categories (groceries, for one) carry no brand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub category: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Product {
    /// Whether the product carries a non-zero discount.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discount_percentage > Decimal::ZERO
    }

    /// Whether the product can currently be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Unit price before discount.
    #[must_use]
    pub const fn list_price(&self) -> Price {
        Price::idr(self.price)
    }

    /// Unit price after discount.
    #[must_use]
    pub fn sale_price(&self) -> Price {
        Price::idr(crate::cart::effective_unit_price(self))
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// URL-safe identifier used for filtering (e.g., "smartphones").
    pub slug: String,
    /// Human-readable name.
    pub name: String,
    /// Upstream listing URL for the category.
    #[serde(default)]
    pub url: String,
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Number of products matching the query across all pages.
    pub total: u32,
    pub skip: u32,
    pub limit: u32,
}

impl ProductPage {
    /// Number of pages needed to show `total` products at `per_page` each.
    #[must_use]
    pub const fn page_count(&self, per_page: u32) -> u32 {
        if per_page == 0 {
            return 0;
        }
        self.total.div_ceil(per_page)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const UPSTREAM_PRODUCT: &str = r#"{
        "id": 1,
        "title": "Essence Mascara Lash Princess",
        "description": "Popular mascara",
        "category": "beauty",
        "price": 9.99,
        "discountPercentage": 7.17,
        "rating": 4.94,
        "stock": 5,
        "tags": ["beauty", "mascara"],
        "brand": "Essence",
        "sku": "RCH45Q1A",
        "thumbnail": "https://cdn.dummyjson.com/products/images/beauty/thumbnail.png",
        "images": ["https://cdn.dummyjson.com/products/images/beauty/1.png"]
    }"#;

    #[test]
    fn test_product_parses_upstream_payload() {
        let product: Product = serde_json::from_str(UPSTREAM_PRODUCT).unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.price, Decimal::new(999, 2));
        assert_eq!(product.discount_percentage, Decimal::new(717, 2));
        assert_eq!(product.brand.as_deref(), Some("Essence"));
        assert_eq!(product.images.len(), 1);
        assert!(product.is_discounted());
        assert!(product.in_stock());
    }

    #[test]
    fn test_product_without_brand_or_tags() {
        let json = r#"{"id": 16, "title": "Apple", "price": 1.99, "category": "groceries"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.brand.is_none());
        assert!(product.tags.is_none());
        assert!(!product.in_stock());
        assert!(!product.is_discounted());
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page = ProductPage {
            products: Vec::new(),
            total: 194,
            skip: 0,
            limit: 12,
        };
        assert_eq!(page.page_count(12), 17);
        assert_eq!(page.page_count(0), 0);
    }
}
