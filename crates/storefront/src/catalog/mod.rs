//! Product catalog API client.
//!
//! # Architecture
//!
//! - Plain REST + JSON over `reqwest`
//! - The catalog is the source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for API responses (TTL from config)
//! - Prices arrive in USD and are converted to IDR before leaving this module
//!
//! # Example
//!
//! ```rust,ignore
//! use zallshop_storefront::catalog::{CatalogClient, ProductQuery};
//!
//! let client = CatalogClient::new(&config.catalog);
//!
//! let page = client.list_products(&ProductQuery::search("phone")).await?;
//! let product = client.get_product(page.products[0].id).await?;
//! ```

mod cache;
mod client;

pub use client::{CatalogClient, PAGE_SIZE, ProductQuery};

use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the catalog.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The catalog answered with a non-success status.
    #[error("Catalog returned HTTP {status}")]
    Upstream { status: u16 },

    /// A request URL could not be built from the configured base URL.
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}

impl CatalogError {
    /// Whether this error means the requested resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
