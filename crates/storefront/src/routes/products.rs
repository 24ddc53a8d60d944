//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tracing::instrument;
use url::form_urlencoded;
use zallshop_core::{Category, Price, Product, ProductId, cart::effective_unit_price};

use crate::catalog::{PAGE_SIZE, ProductQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Categories offered in the listing filter.
const FILTER_CATEGORIES: usize = 15;

/// Images shown on the detail page.
const DETAIL_IMAGES: usize = 5;

/// Page links shown around the current page.
const PAGINATION_WINDOW: u32 = 5;

// =============================================================================
// Views
// =============================================================================

/// Product card display data, shared by the home page and listing.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub thumbnail: String,
    pub rating: String,
    pub stock: u32,
    pub price: String,
    pub original_price: Option<String>,
    pub discount_badge: Option<String>,
}

/// Rounded discount badge, e.g. "-12%".
fn discount_badge(product: &Product) -> Option<String> {
    product.is_discounted().then(|| {
        let percent = product
            .discount_percentage
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        format!("-{percent}%")
    })
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i64(),
            title: product.title.clone(),
            category: product.category.clone(),
            thumbnail: product.thumbnail.clone(),
            rating: product.rating.to_string(),
            stock: product.stock,
            price: product.sale_price().display(),
            original_price: product
                .is_discounted()
                .then(|| product.list_price().display()),
            discount_badge: discount_badge(product),
        }
    }
}

/// Product detail display data.
pub struct ProductDetailView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub brand: Option<String>,
    pub rating: String,
    pub stock: u32,
    pub in_stock: bool,
    pub price: String,
    pub original_price: Option<String>,
    pub savings: Option<String>,
    pub discount_badge: Option<String>,
    pub main_image: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        let unit_savings = product.price - effective_unit_price(product);

        Self {
            id: product.id.as_i64(),
            title: product.title.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            brand: product.brand.clone(),
            rating: product.rating.to_string(),
            stock: product.stock,
            in_stock: product.in_stock(),
            price: product.sale_price().display(),
            original_price: (unit_savings > Decimal::ZERO).then(|| product.list_price().display()),
            savings: (unit_savings > Decimal::ZERO).then(|| Price::idr(unit_savings).display()),
            discount_badge: discount_badge(product),
            main_image: product
                .images
                .first()
                .cloned()
                .unwrap_or_else(|| product.thumbnail.clone()),
            images: if product.images.len() > 1 {
                product.images.iter().take(DETAIL_IMAGES).cloned().collect()
            } else {
                Vec::new()
            },
            tags: product.tags.clone().unwrap_or_default(),
        }
    }
}

/// Category filter chip.
pub struct CategoryChip {
    pub name: String,
    pub href: String,
    pub active: bool,
}

/// A numbered pagination link.
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub active: bool,
}

/// Pagination controls for the listing.
pub struct Pagination {
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub pages: Vec<PageLink>,
}

// =============================================================================
// Listing helpers
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    /// Parsed leniently: anything that is not a positive integer means page 1.
    pub page: Option<String>,
}

impl ListingQuery {
    fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1)
    }
}

/// Build a listing URL. Page 1 is left implicit.
fn listing_href(search: Option<&str>, category: Option<&str>, page: u32) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    if let Some(q) = search {
        params.append_pair("q", q);
    }
    if let Some(slug) = category {
        params.append_pair("category", slug);
    }
    if page > 1 {
        params.append_pair("page", &page.to_string());
    }

    let params = params.finish();
    if params.is_empty() {
        "/products".to_string()
    } else {
        format!("/products?{params}")
    }
}

/// Document title for a listing.
fn listing_title(search: Option<&str>, category: Option<&str>) -> String {
    match (search, category) {
        (Some(q), _) => format!("Results: \"{q}\""),
        (None, Some(slug)) => format!("Category: {slug}"),
        (None, None) => "All products".to_string(),
    }
}

/// Pagination for `page` of `total_pages`, or `None` when one page suffices.
fn paginate(
    search: Option<&str>,
    category: Option<&str>,
    page: u32,
    total_pages: u32,
) -> Option<Pagination> {
    if total_pages <= 1 {
        return None;
    }

    let first = page.saturating_sub(2).max(1);
    let pages = (first..first.saturating_add(PAGINATION_WINDOW.min(total_pages)))
        .filter(|p| *p <= total_pages)
        .map(|number| PageLink {
            number,
            href: listing_href(search, category, number),
            active: number == page,
        })
        .collect();

    Some(Pagination {
        prev_href: (page > 1).then(|| listing_href(search, category, page - 1)),
        next_href: (page < total_pages).then(|| listing_href(search, category, page + 1)),
        pages,
    })
}

/// Category chips; clicking the active one clears the filter.
fn category_chips(categories: &[Category], active: Option<&str>) -> Vec<CategoryChip> {
    categories
        .iter()
        .take(FILTER_CATEGORIES)
        .map(|category| {
            let is_active = active == Some(category.slug.as_str());
            CategoryChip {
                name: category.name.clone(),
                href: if is_active {
                    listing_href(None, None, 1)
                } else {
                    listing_href(None, Some(category.slug.as_str()), 1)
                },
                active: is_active,
            }
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page_title: String,
    pub search: String,
    pub active_category: Option<String>,
    pub categories: Vec<CategoryChip>,
    pub all_href: String,
    pub products: Vec<ProductCardView>,
    pub shown: usize,
    pub total: u32,
    pub pagination: Option<Pagination>,
    /// The catalog could not be reached.
    pub load_failed: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display product listing page.
///
/// Catalog failures render an inline message instead of an error page so the
/// search box and filters stay usable.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let search = query.search();
    let category = query.category();
    let page = query.page();

    let categories = state.catalog().list_categories().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch categories");
        Vec::new()
    });

    let product_query = ProductQuery {
        search: search.map(str::to_string),
        category: category.map(str::to_string),
        ..ProductQuery::default()
    }
    .page(page, PAGE_SIZE);

    let (products, total, total_pages, load_failed) =
        match state.catalog().list_products(&product_query).await {
            Ok(listing) => (
                listing
                    .products
                    .iter()
                    .map(ProductCardView::from)
                    .collect::<Vec<_>>(),
                listing.total,
                listing.page_count(PAGE_SIZE),
                false,
            ),
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch products");
                (Vec::new(), 0, 0, true)
            }
        };

    ProductsIndexTemplate {
        page_title: listing_title(search, category),
        search: search.unwrap_or_default().to_string(),
        active_category: category.map(str::to_string),
        categories: category_chips(&categories, category),
        all_href: listing_href(None, None, 1),
        shown: products.len(),
        products,
        total,
        pagination: paginate(search, category, page, total_pages),
        load_failed,
    }
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("Product not found: {id}")))?;

    let product = state.catalog().get_product(id).await?;

    Ok(ProductShowTemplate {
        product: ProductDetailView::from(&product),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::product;

    #[test]
    fn test_listing_page_is_lenient() {
        let page = |p: &str| {
            ListingQuery {
                page: Some(p.to_string()),
                ..ListingQuery::default()
            }
            .page()
        };
        assert_eq!(page("3"), 3);
        assert_eq!(page("0"), 1);
        assert_eq!(page("-2"), 1);
        assert_eq!(page("abc"), 1);
        assert_eq!(ListingQuery::default().page(), 1);
    }

    #[test]
    fn test_listing_href() {
        assert_eq!(listing_href(None, None, 1), "/products");
        assert_eq!(listing_href(None, Some("laptops"), 1), "/products?category=laptops");
        assert_eq!(
            listing_href(Some("red phone"), None, 2),
            "/products?q=red+phone&page=2"
        );
    }

    #[test]
    fn test_listing_title_prefers_search() {
        assert_eq!(listing_title(Some("phone"), Some("laptops")), "Results: \"phone\"");
        assert_eq!(listing_title(None, Some("laptops")), "Category: laptops");
        assert_eq!(listing_title(None, None), "All products");
    }

    #[test]
    fn test_single_page_has_no_pagination() {
        assert!(paginate(None, None, 1, 1).is_none());
        assert!(paginate(None, None, 1, 0).is_none());
    }

    #[test]
    fn test_pagination_window() {
        let pagination = paginate(None, None, 6, 10).unwrap();
        let numbers: Vec<u32> = pagination.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![4, 5, 6, 7, 8]);
        assert!(pagination.pages.iter().any(|p| p.active && p.number == 6));
        assert_eq!(pagination.prev_href.as_deref(), Some("/products?page=5"));
        assert_eq!(pagination.next_href.as_deref(), Some("/products?page=7"));
    }

    #[test]
    fn test_pagination_window_clipped_at_end() {
        let pagination = paginate(None, Some("tops"), 3, 3).unwrap();
        let numbers: Vec<u32> = pagination.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(pagination.next_href.is_none());
    }

    #[test]
    fn test_active_category_chip_clears_filter() {
        let categories = vec![
            Category {
                slug: "beauty".to_string(),
                name: "Beauty".to_string(),
                url: String::new(),
            },
            Category {
                slug: "laptops".to_string(),
                name: "Laptops".to_string(),
                url: String::new(),
            },
        ];

        let chips = category_chips(&categories, Some("laptops"));
        assert_eq!(chips[0].href, "/products?category=beauty");
        assert!(chips[1].active);
        assert_eq!(chips[1].href, "/products");
    }

    #[test]
    fn test_card_view_for_discounted_product() {
        let view = ProductCardView::from(&product(1, 100_000, 10));
        assert_eq!(view.price, "Rp\u{a0}90.000");
        assert_eq!(view.original_price.as_deref(), Some("Rp\u{a0}100.000"));
        assert_eq!(view.discount_badge.as_deref(), Some("-10%"));
    }

    #[test]
    fn test_detail_view_savings_and_images() {
        let mut p = product(2, 200_000, 25);
        p.images = (1..=7).map(|i| format!("img{i}.webp")).collect();
        p.stock = 0;

        let view = ProductDetailView::from(&p);
        assert_eq!(view.savings.as_deref(), Some("Rp\u{a0}50.000"));
        assert_eq!(view.images.len(), 5);
        assert_eq!(view.main_image, "img1.webp");
        assert!(!view.in_stock);
    }

    #[test]
    fn test_detail_view_without_discount() {
        let view = ProductDetailView::from(&product(3, 5_000, 0));
        assert!(view.original_price.is_none());
        assert!(view.savings.is_none());
        assert!(view.images.is_empty());
    }
}
