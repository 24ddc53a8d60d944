//! Catalog API client implementation.
//!
//! Caches products, listings and categories using `moka`. Search results are
//! never cached.

use std::sync::Arc;

use moka::future::Cache;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;
use zallshop_core::{Category, Product, ProductId, ProductPage};

use super::CatalogError;
use super::cache::{CacheKey, CacheValue};
use crate::config::CatalogConfig;

/// Products per listing page.
pub const PAGE_SIZE: u32 = 12;

/// Listing query: free-text search or category filter, plus pagination.
///
/// When both `search` and `category` are set, search wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub limit: u32,
    pub skip: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            limit: PAGE_SIZE,
            skip: 0,
        }
    }
}

impl ProductQuery {
    /// Free-text search query.
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    /// Category filter query.
    #[must_use]
    pub fn category(slug: impl Into<String>) -> Self {
        Self {
            category: Some(slug.into()),
            ..Self::default()
        }
    }

    /// Set `limit`/`skip` for a 1-based page number.
    #[must_use]
    pub const fn page(mut self, page: u32, per_page: u32) -> Self {
        self.limit = per_page;
        self.skip = page.saturating_sub(1).saturating_mul(per_page);
        self
    }

    fn search_term(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    fn category_slug(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the product catalog API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    exchange_rate: Decimal,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("zallshop-storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build configured HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                exchange_rate: config.exchange_rate,
                cache,
            }),
        }
    }

    /// Build an endpoint URL under the configured base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build the listing URL for a query.
    fn products_url(&self, query: &ProductQuery) -> Result<Url, CatalogError> {
        let mut url = if let Some(term) = query.search_term() {
            let mut url = self.endpoint(&["products", "search"])?;
            url.query_pairs_mut().append_pair("q", term);
            url
        } else if let Some(slug) = query.category_slug() {
            self.endpoint(&["products", "category", slug])?
        } else {
            self.endpoint(&["products"])?
        };

        url.query_pairs_mut()
            .append_pair("limit", &query.limit.to_string())
            .append_pair("skip", &query.skip.to_string());
        Ok(url)
    }

    /// Execute a GET request and decode the JSON body.
    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let response = self.inner.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(url.path().to_string()));
        }

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                url = %url,
                body = %response_text.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Upstream {
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }

    /// Convert a catalog price into the display currency, in whole units.
    fn adjust_price(&self, mut product: Product) -> Product {
        product.price = (product.price * self.inner.exchange_rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        product
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a page of products, optionally searched or filtered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError> {
        let cache_key = query.search_term().is_none().then(|| CacheKey::Products {
            category: query.category_slug().map(str::to_string),
            limit: query.limit,
            skip: query.skip,
        });

        // Check cache (only for queries without search)
        if let Some(key) = &cache_key
            && let Some(CacheValue::Products(page)) = self.inner.cache.get(key).await
        {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let url = self.products_url(query)?;
        let mut page: ProductPage = self.fetch(url).await?;
        page.products = page
            .products
            .into_iter()
            .map(|p| self.adjust_price(p))
            .collect();

        if let Some(key) = cache_key {
            self.inner
                .cache
                .insert(key, CacheValue::Products(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a product by its id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the catalog has no such product,
    /// or another error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", &id.to_string()])?;
        let product: Product = self.fetch(url).await.map_err(|e| match e {
            CatalogError::NotFound(_) => CatalogError::NotFound(format!("Product not found: {id}")),
            other => other,
        })?;
        let product = self.adjust_price(product);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get all product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint(&["products", "categories"])?;
        let categories: Vec<Category> = self.fetch(url).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
