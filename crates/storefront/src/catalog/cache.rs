//! Cache types for catalog API responses.

use zallshop_core::{Category, Product, ProductId, ProductPage};

/// Cache key for products and categories.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products {
        category: Option<String>,
        limit: u32,
        skip: u32,
    },
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
    Categories(Vec<Category>),
}
