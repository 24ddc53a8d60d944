//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing (?q= ?category= ?page=)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (HTMX fragments, redirects for plain forms)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit (returns count badge, triggers cart-updated)
//! POST /cart/update            - Set quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove line (returns cart_items fragment)
//! POST /cart/clear             - Empty cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Order summary
//! POST /checkout               - Complete purchase
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Simulated checkout
        .route("/checkout", get(checkout::show).post(checkout::complete))
}
