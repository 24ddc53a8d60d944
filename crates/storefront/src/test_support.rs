//! Shared fixtures for unit tests.

use rust_decimal::Decimal;
use zallshop_core::{Product, ProductId};

/// A product with whole-unit `price` and `discount` percent.
pub fn product(id: i64, price: i64, discount: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        description: format!("Description of product {id}"),
        price: Decimal::new(price, 0),
        discount_percentage: Decimal::new(discount, 0),
        rating: 4.5,
        stock: 10,
        brand: Some("Zall".to_string()),
        category: "smartphones".to_string(),
        thumbnail: format!("https://cdn.dummyjson.com/products/{id}/thumbnail.webp"),
        images: vec![format!("https://cdn.dummyjson.com/products/{id}/1.webp")],
        tags: None,
    }
}
