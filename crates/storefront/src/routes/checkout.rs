//! Checkout route handlers.
//!
//! Checkout is simulated: completing a purchase waits for the configured
//! processing delay, then empties the cart and shows a confirmation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::cart::CartView;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::models::BrowserId;
use crate::state::AppState;

/// Checkout summary template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
}

/// Shown when there is nothing to check out.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/empty.html")]
pub struct CheckoutEmptyTemplate;

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub unit_count: u64,
    pub total: String,
}

/// Display the checkout summary.
#[instrument(skip(state, browser), fields(browser_id = %browser))]
pub async fn show(State(state): State<AppState>, browser: BrowserId) -> Response {
    let snapshot = state.carts().snapshot(browser);

    if snapshot.is_empty() {
        return CheckoutEmptyTemplate.into_response();
    }

    CheckoutTemplate {
        cart: CartView::from(&snapshot),
    }
    .into_response()
}

/// Complete the purchase.
///
/// The confirmation reflects the cart as it was when the purchase started.
/// Anything added during the processing delay is cleared along with it.
#[instrument(skip(state, browser), fields(browser_id = %browser))]
pub async fn complete(State(state): State<AppState>, browser: BrowserId) -> Response {
    let snapshot = state.carts().snapshot(browser);

    if snapshot.is_empty() {
        return CheckoutEmptyTemplate.into_response();
    }

    let totals = snapshot.totals();
    tokio::time::sleep(state.config().checkout_delay).await;

    state.carts().with_cart(browser, |cart| cart.clear_cart());

    let total = totals.total_price().display();
    tracing::info!(units = totals.unit_count, %total, "Checkout completed");
    add_breadcrumb("checkout", "Checkout completed", Some(&[("total", total.as_str())]));

    CheckoutSuccessTemplate {
        unit_count: totals.unit_count,
        total,
    }
    .into_response()
}
