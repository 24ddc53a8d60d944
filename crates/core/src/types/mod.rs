//! Core types for Zallshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;

pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{Category, Product, ProductPage};
