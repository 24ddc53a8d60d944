//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! HTMX requests get a fragment back plus an `HX-Trigger: cart-updated`
//! header so the count badge refreshes; plain form posts get a redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;
use zallshop_core::{CartItem, CartState, Price, ProductId, cart::effective_unit_price};

use crate::error::Result;
use crate::filters;
use crate::models::BrowserId;
use crate::state::AppState;

/// Event name broadcast to the page after every cart change.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: i64,
    pub title: String,
    pub category: String,
    pub thumbnail: String,
    pub quantity: u32,
    pub unit_price: String,
    pub original_price: Option<String>,
    pub line_total: String,
    /// Quantity submitted by the "+" button.
    pub increment: i64,
    /// Quantity submitted by the "-" button; zero removes the line.
    pub decrement: i64,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        let product = &item.product;
        let quantity = i64::from(item.quantity);

        Self {
            product_id: product.id.as_i64(),
            title: product.title.clone(),
            category: product.category.clone(),
            thumbnail: product.thumbnail.clone(),
            quantity: item.quantity,
            unit_price: Price::idr(effective_unit_price(product)).display(),
            original_price: product
                .is_discounted()
                .then(|| product.list_price().display()),
            line_total: Price::idr(item.line_total()).display(),
            increment: quantity + 1,
            decrement: quantity - 1,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub savings: Option<String>,
    pub total: String,
    pub unit_count: u64,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        let totals = state.totals();

        Self {
            lines: state.items.iter().map(CartLineView::from).collect(),
            subtotal: totals.subtotal_price().display(),
            savings: totals
                .has_savings()
                .then(|| totals.savings_price().display()),
            total: totals.total_price().display(),
            unit_count: totals.unit_count,
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    /// Where a non-HTMX post should land afterwards.
    pub return_to: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

// =============================================================================
// Helpers
// =============================================================================

/// Whether the request was issued by HTMX.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Only same-site absolute paths are accepted as redirect targets.
fn safe_return_path(candidate: Option<&str>) -> &str {
    candidate
        .filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
        .unwrap_or("/cart")
}

/// Respond to a cart mutation made from the cart page.
fn cart_changed(headers: &HeaderMap, state: &CartState) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]),
            CartItemsTemplate {
                cart: CartView::from(state),
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, browser), fields(browser_id = %browser))]
pub async fn show(State(state): State<AppState>, browser: BrowserId) -> impl IntoResponse {
    let snapshot = state.carts().snapshot(browser);

    CartShowTemplate {
        cart: CartView::from(&snapshot),
    }
}

/// Add one unit of a product to the cart.
///
/// The product is fetched from the catalog first; the cart stores that
/// snapshot, not a reference.
#[instrument(skip(state, browser, headers), fields(browser_id = %browser))]
pub async fn add(
    State(state): State<AppState>,
    browser: BrowserId,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state.catalog().get_product(form.product_id).await?;

    let count = state.carts().with_cart(browser, |cart| {
        cart.add_item(product);
        cart.totals().unit_count
    });

    tracing::info!(product_id = %form.product_id, units = count, "Added to cart");

    if is_htmx(&headers) {
        return Ok((
            AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]),
            CartCountTemplate { count },
        )
            .into_response());
    }

    Ok(Redirect::to(safe_return_path(form.return_to.as_deref())).into_response())
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(state, browser, headers), fields(browser_id = %browser))]
pub async fn update(
    State(state): State<AppState>,
    browser: BrowserId,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let snapshot = state.carts().with_cart(browser, |cart| {
        cart.update_quantity(form.product_id, form.quantity);
        cart.snapshot()
    });

    cart_changed(&headers, &snapshot)
}

/// Remove a line from the cart.
#[instrument(skip(state, browser, headers), fields(browser_id = %browser))]
pub async fn remove(
    State(state): State<AppState>,
    browser: BrowserId,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let snapshot = state.carts().with_cart(browser, |cart| {
        cart.remove_item(form.product_id);
        cart.snapshot()
    });

    cart_changed(&headers, &snapshot)
}

/// Empty the cart.
#[instrument(skip(state, browser, headers), fields(browser_id = %browser))]
pub async fn clear(
    State(state): State<AppState>,
    browser: BrowserId,
    headers: HeaderMap,
) -> Response {
    let snapshot = state.carts().with_cart(browser, |cart| {
        cart.clear_cart();
        cart.snapshot()
    });

    cart_changed(&headers, &snapshot)
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, browser), fields(browser_id = %browser))]
pub async fn count(State(state): State<AppState>, browser: BrowserId) -> impl IntoResponse {
    let count = state
        .carts()
        .with_cart(browser, |cart| cart.totals().unit_count);

    CartCountTemplate { count }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use zallshop_core::{CartStore, MemoryStorage};

    use super::*;
    use crate::test_support::product;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));

        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/products/3")), "/products/3");
        assert_eq!(safe_return_path(Some("https://evil.example")), "/cart");
        assert_eq!(safe_return_path(Some("//evil.example")), "/cart");
        assert_eq!(safe_return_path(Some("/\\evil.example")), "/cart");
        assert_eq!(safe_return_path(None), "/cart");
    }

    #[test]
    fn test_cart_view_matches_totals() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(1, 100_000, 10));
        cart.add_item(product(1, 100_000, 10));
        cart.add_item(product(2, 50_000, 0));

        let view = CartView::from(cart.state());
        assert_eq!(view.unit_count, 3);
        assert_eq!(view.subtotal, "Rp\u{a0}250.000");
        assert_eq!(view.total, "Rp\u{a0}230.000");
        assert_eq!(view.savings.as_deref(), Some("Rp\u{a0}20.000"));

        let first = &view.lines[0];
        assert_eq!(first.unit_price, "Rp\u{a0}90.000");
        assert_eq!(first.original_price.as_deref(), Some("Rp\u{a0}100.000"));
        assert_eq!(first.line_total, "Rp\u{a0}180.000");
        assert_eq!((first.increment, first.decrement), (3, 1));
    }

    #[test]
    fn test_cart_view_without_savings() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_item(product(5, 1_000, 0));

        let view = CartView::from(cart.state());
        assert!(view.savings.is_none());
        assert!(view.lines[0].original_price.is_none());
        assert!(!view.is_empty());
    }
}
