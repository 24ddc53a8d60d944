//! Zallshop Core - Shared types and the cart state container.
//!
//! This crate provides the types used across all Zallshop components:
//! - `storefront` - Public-facing server-rendered shop
//! - `integration-tests` - Cross-crate tests
//!
//! # Architecture
//!
//! The core crate contains types, the cart store and its pure projections.
//! It performs no HTTP and owns no storage backend beyond an in-memory one;
//! real backends plug in through [`cart::CartStorage`].
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices and catalog data
//! - [`cart`] - Cart state, store, persistence seam and totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{
    CartItem, CartState, CartStorage, CartStore, CartTotals, ListenerId, MemoryStorage,
    NAMESPACE_KEY, StorageError,
};
pub use types::*;
