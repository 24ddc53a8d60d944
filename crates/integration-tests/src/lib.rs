//! Integration test harness for Zallshop.
//!
//! Everything runs in-process: a fake catalog API stands in for the upstream
//! product service, and the real storefront router is served on an ephemeral
//! port and driven over HTTP with a cookie-aware `reqwest` client.
//!
//! # Test Categories
//!
//! - `cart_store` - cart contract through the public core API
//! - `catalog_client` - catalog client against the fake upstream
//! - `storefront_flow` - browse, cart and checkout through HTTP

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;
use zallshop_storefront::build_router;
use zallshop_storefront::config::{CatalogConfig, StorefrontConfig};
use zallshop_storefront::state::AppState;

/// Number of products the fake catalog serves.
pub const FAKE_PRODUCT_COUNT: u32 = 30;

/// Categories the fake catalog knows, in listing order.
pub const FAKE_CATEGORIES: [&str; 3] = ["beauty", "smartphones", "laptops"];

// =============================================================================
// Fake catalog
// =============================================================================

/// Catalog fixture product, priced in USD like the real upstream.
#[must_use]
pub fn fake_product(id: u32) -> Value {
    let (title, price, discount) = match id {
        1 => ("Essence Mascara Lash Princess".to_string(), 9.99, 7.17),
        2 => ("iPhone 9".to_string(), 549.0, 0.0),
        _ => (
            format!("Fixture Product {id}"),
            f64::from(id) + 0.5,
            if id % 4 == 0 { 10.0 } else { 0.0 },
        ),
    };

    let index = usize::try_from(id).unwrap_or(0) % FAKE_CATEGORIES.len();

    json!({
        "id": id,
        "title": title,
        "description": format!("Description of {title}"),
        "price": price,
        "discountPercentage": discount,
        "rating": 4.5,
        "stock": if id == 3 { 0 } else { 25 },
        "brand": "Fixture",
        "category": FAKE_CATEGORIES[index],
        "thumbnail": format!("https://cdn.dummyjson.com/products/{id}/thumbnail.webp"),
        "images": [
            format!("https://cdn.dummyjson.com/products/{id}/1.webp"),
            format!("https://cdn.dummyjson.com/products/{id}/2.webp"),
        ],
        "tags": ["fixture"],
    })
}

fn all_products() -> Vec<Value> {
    (1..=FAKE_PRODUCT_COUNT).map(fake_product).collect()
}

#[derive(Debug, Deserialize)]
struct PageParams {
    q: Option<String>,
    limit: Option<usize>,
    skip: Option<usize>,
}

fn page_of(products: Vec<Value>, params: &PageParams) -> Json<Value> {
    let total = products.len();
    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(30);
    let page: Vec<Value> = products.into_iter().skip(skip).take(limit).collect();

    Json(json!({
        "products": page,
        "total": total,
        "skip": skip,
        "limit": limit,
    }))
}

async fn list_products(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<PageParams>,
) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    page_of(all_products(), &params)
}

async fn search_products(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<PageParams>,
) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    let needle = params.q.clone().unwrap_or_default().to_lowercase();
    let matches = all_products()
        .into_iter()
        .filter(|p| {
            p["title"]
                .as_str()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect();
    page_of(matches, &params)
}

async fn products_in_category(
    State(hits): State<Arc<AtomicUsize>>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    let matches = all_products()
        .into_iter()
        .filter(|p| p["category"] == slug.as_str())
        .collect();
    page_of(matches, &params)
}

async fn categories(State(hits): State<Arc<AtomicUsize>>) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    let list: Vec<Value> = FAKE_CATEGORIES
        .iter()
        .map(|slug| {
            json!({
                "slug": slug,
                "name": format!("{}{}", slug[..1].to_uppercase(), &slug[1..]),
                "url": format!("https://dummyjson.com/products/category/{slug}"),
            })
        })
        .collect();
    Json(Value::Array(list))
}

async fn product_by_id(State(hits): State<Arc<AtomicUsize>>, Path(id): Path<String>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    match id.parse::<u32>() {
        Ok(n) if (1..=FAKE_PRODUCT_COUNT).contains(&n) => Json(fake_product(n)).into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("Product with id '{id}' not found") })),
        )
            .into_response(),
    }
}

async fn always_failing() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn always_limited() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert("Retry-After", HeaderValue::from_static("7"));
    (StatusCode::TOO_MANY_REQUESTS, headers)
}

/// An in-process stand-in for the catalog API.
///
/// `base_url` serves the catalog. `broken_url` answers every request with
/// HTTP 500 and `limited_url` with HTTP 429.
pub struct FakeCatalog {
    pub base_url: Url,
    pub broken_url: Url,
    pub limited_url: Url,
    hits: Arc<AtomicUsize>,
}

impl FakeCatalog {
    /// Start the fake catalog on an ephemeral port.
    pub async fn spawn() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));

        let catalog = Router::new()
            .route("/products", get(list_products))
            .route("/products/search", get(search_products))
            .route("/products/categories", get(categories))
            .route("/products/category/{slug}", get(products_in_category))
            .route("/products/{id}", get(product_by_id))
            .with_state(Arc::clone(&hits));

        let app = Router::new()
            .route("/broken/{*rest}", get(always_failing))
            .route("/limited/{*rest}", get(always_limited))
            .merge(catalog);

        let addr = serve(app).await;

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).unwrap(),
            broken_url: Url::parse(&format!("http://{addr}/broken/")).unwrap(),
            limited_url: Url::parse(&format!("http://{addr}/limited/")).unwrap(),
            hits,
        }
    }

    /// Number of catalog requests served so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Catalog client configuration pointing at `base_url`.
    #[must_use]
    pub fn config(&self) -> CatalogConfig {
        self.config_for(self.base_url.clone())
    }

    /// Catalog client configuration pointing at `url`.
    #[must_use]
    pub fn config_for(&self, url: Url) -> CatalogConfig {
        CatalogConfig {
            base_url: url,
            timeout: Duration::from_secs(5),
            ..CatalogConfig::default()
        }
    }
}

/// Serve `app` on an ephemeral localhost port.
async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    addr
}

// =============================================================================
// Storefront
// =============================================================================

/// A running storefront backed by a fake catalog.
pub struct TestContext {
    /// Cookie-aware client, so requests share one browser session.
    pub client: reqwest::Client,
    pub storefront_url: String,
    pub catalog: FakeCatalog,
    _storage: TempDir,
}

impl TestContext {
    /// Start a storefront with file-backed carts and no checkout delay.
    pub async fn new() -> Self {
        Self::start(FakeCatalog::config).await
    }

    /// Start a storefront whose catalog answers every request with HTTP 500.
    pub async fn with_broken_catalog() -> Self {
        Self::start(|fake| fake.config_for(fake.broken_url.clone())).await
    }

    async fn start(catalog_config: impl FnOnce(&FakeCatalog) -> CatalogConfig) -> Self {
        let catalog = FakeCatalog::spawn().await;
        let storage = tempfile::tempdir().expect("Failed to create storage dir");

        let config = StorefrontConfig {
            storage_dir: Some(storage.path().to_path_buf()),
            checkout_delay: Duration::ZERO,
            catalog: catalog_config(&catalog),
            ..StorefrontConfig::default()
        };

        let state = AppState::new(config).expect("Failed to build app state");
        let addr = serve(build_router(state)).await;

        Self {
            client: browser(),
            storefront_url: format!("http://{addr}"),
            catalog,
            _storage: storage,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// GET a page and return its status and body.
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.text().await.unwrap())
    }

    /// POST a form as HTMX would and return the raw response.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .unwrap()
    }
}

/// A fresh cookie-aware client, standing in for a separate browser.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
