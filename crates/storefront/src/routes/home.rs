//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;
use zallshop_core::Category;

use super::products::ProductCardView;
use crate::catalog::ProductQuery;
use crate::filters;
use crate::state::AppState;

/// Number of featured products on the home page.
const FEATURED_PRODUCTS: u32 = 4;

/// Number of categories in the home page grid.
const HOME_CATEGORIES: usize = 8;

/// Category tile display data.
#[derive(Clone)]
pub struct CategoryTileView {
    pub name: String,
    pub href: String,
}

impl From<&Category> for CategoryTileView {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            href: format!("/products?category={}", category.slug),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured_products: Vec<ProductCardView>,
    pub categories: Vec<CategoryTileView>,
    /// Number of categories the catalog offers in total.
    pub category_count: usize,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let query = ProductQuery {
        limit: FEATURED_PRODUCTS,
        ..ProductQuery::default()
    };

    let featured_products = state.catalog().list_products(&query).await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch featured products: {e}");
            Vec::new()
        },
        |page| page.products.iter().map(ProductCardView::from).collect(),
    );

    let all_categories = state.catalog().list_categories().await.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch categories: {e}");
        Vec::new()
    });

    HomeTemplate {
        featured_products,
        categories: all_categories
            .iter()
            .take(HOME_CATEGORIES)
            .map(CategoryTileView::from)
            .collect(),
        category_count: all_categories.len(),
    }
}
