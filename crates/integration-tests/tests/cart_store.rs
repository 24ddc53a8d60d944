//! Cart store contract through the public API, over real storage backends.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;
use zallshop_core::{CartStore, NAMESPACE_KEY, Product, ProductId};
use zallshop_storefront::models::BrowserId;
use zallshop_storefront::services::CartRegistry;
use zallshop_storefront::storage::{BrowserCartStorage, FileLocalStore, LocalStore};

fn product(id: i64, price: i64, discount: i64) -> Product {
    serde_json::from_value(json!({
        "id": id,
        "title": format!("Product {id}"),
        "price": price,
        "discountPercentage": discount,
        "stock": 5,
        "category": "smartphones",
        "thumbnail": format!("https://cdn.dummyjson.com/products/{id}/thumbnail.webp"),
    }))
    .unwrap()
}

fn file_store(dir: &tempfile::TempDir) -> Arc<dyn LocalStore> {
    Arc::new(FileLocalStore::open(dir.path()).unwrap())
}

#[test]
fn test_cart_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let browser = BrowserId::generate();

    {
        let mut cart = CartStore::open(BrowserCartStorage::new(file_store(&dir), &browser));
        cart.add_item(product(1, 100_000, 10));
        cart.add_item(product(1, 100_000, 10));
        cart.add_item(product(2, 50_000, 0));
        cart.update_quantity(ProductId::new(2), 3);
    }

    let cart = CartStore::open(BrowserCartStorage::new(file_store(&dir), &browser));
    let ids: Vec<i64> = cart.items().iter().map(|i| i.product.id.as_i64()).collect();
    assert_eq!(ids, [1, 2]);
    assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    assert_eq!(cart.quantity_of(ProductId::new(2)), 3);

    let totals = cart.totals();
    assert_eq!(totals.subtotal, Decimal::new(350_000, 0));
    assert_eq!(totals.total, Decimal::new(330_000, 0));
    assert_eq!(totals.savings, Decimal::new(20_000, 0));
    assert_eq!(totals.unit_count, 5);
}

#[test]
fn test_record_on_disk_is_versioned_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let browser = BrowserId::generate();

    let mut cart = CartStore::open(BrowserCartStorage::new(file_store(&dir), &browser));
    cart.add_item(product(7, 1_000, 0));

    let path = dir
        .path()
        .join(browser.to_string())
        .join(format!("{NAMESPACE_KEY}.json"));
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(record["version"], 0);
    assert_eq!(record["state"]["items"][0]["quantity"], 1);
    assert_eq!(record["state"]["items"][0]["product"]["id"], 7);
}

#[test]
fn test_corrupt_record_starts_empty_and_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    let browser = BrowserId::generate();
    store
        .set_item(&browser.to_string(), NAMESPACE_KEY, "{not json")
        .unwrap();

    let mut cart = CartStore::open(BrowserCartStorage::new(Arc::clone(&store), &browser));
    assert!(cart.is_empty());

    cart.add_item(product(3, 10, 0));
    let reopened = CartStore::open(BrowserCartStorage::new(store, &browser));
    assert_eq!(reopened.quantity_of(ProductId::new(3)), 1);
}

#[test]
fn test_listeners_see_every_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let browser = BrowserId::generate();
    let mut cart = CartStore::open(BrowserCartStorage::new(file_store(&dir), &browser));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = cart.subscribe(move |state| sink.lock().unwrap().push(state.totals().unit_count));

    cart.add_item(product(1, 10, 0));
    cart.add_item(product(1, 10, 0));
    cart.update_quantity(ProductId::new(1), 4);
    cart.remove_item(ProductId::new(1));
    assert!(cart.unsubscribe(id));
    cart.add_item(product(1, 10, 0));

    assert_eq!(*seen.lock().unwrap(), [1, 2, 4, 0]);
}

#[test]
fn test_registry_rehydrates_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let browser = BrowserId::generate();

    let registry = CartRegistry::new(file_store(&dir), Duration::from_secs(60));
    registry.with_cart(browser, |cart| cart.add_item(product(9, 500, 0)));

    let fresh = CartRegistry::new(file_store(&dir), Duration::from_secs(60));
    let snapshot = fresh.snapshot(browser);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.totals().total, Decimal::new(500, 0));
}
