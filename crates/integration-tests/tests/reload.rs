//! Carts surviving a reload through the storage file.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::Path;

use storecart_core::{LineKey, ProductId, VariantAttributes};
use storecart_integration_tests::product;
use storecart_storefront::config::StorefrontConfig;
use storecart_storefront::state::AppState;
use storecart_storefront::storage::{FileStorage, StorageArea};

fn open(path: &Path) -> AppState {
    let mut config = StorefrontConfig::default();
    config.storage.path = path.to_path_buf();
    AppState::open(config).unwrap()
}

fn write_slot(path: &Path, value: &str) {
    let area = serde_json::json!({ "cart": value });
    std::fs::write(path, area.to_string()).unwrap();
}

#[test]
fn test_cart_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("local_storage.json");

    {
        let state = open(&path);
        state.store().add_item(product("pump-2", "Pump B")).unwrap();
        state
            .store()
            .add_item(
                product("pump-1", "Pump A").with_attributes(
                    VariantAttributes::from_pairs([("head", "10"), ("capacity", "40")]).unwrap(),
                ),
            )
            .unwrap();
        state.store().add_item(product("pump-2", "Pump B")).unwrap();
    }

    let state = open(&path);
    let lines = state.store().lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].key().encode(), "pump-2");
    assert_eq!(lines[0].quantity(), 2);
    assert_eq!(lines[1].key().encode(), "pump-1?capacity=40&head=10");
    assert_eq!(lines[1].variant_attributes().get("head"), Some("10"));
    assert_eq!(state.panel().fragments().item_count, 3);
}

#[test]
fn test_first_open_writes_empty_cart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local_storage.json");

    let _state = open(&path);
    let storage = FileStorage::new(&path);
    assert_eq!(storage.get_item("cart").unwrap().as_deref(), Some("{}"));
}

#[test]
fn test_reads_simple_product_carts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    write_slot(
        &path,
        r#"{"pump-1":{"name":"Pump A","image":"img/a.jpg","quantity":2,"addedAt":"2024-01-01T00:00:00.000Z"},"pump-2":{"name":"Pump B","quantity":1,"addedAt":"2024-01-02T08:30:00.000Z"}}"#,
    );

    let state = open(&path);
    let cart = state.store().cart();
    let line = cart
        .get(&LineKey::simple(ProductId::parse("pump-1").unwrap()))
        .unwrap();
    assert_eq!(line.quantity(), 2);
    assert_eq!(line.image(), Some("img/a.jpg"));
    assert_eq!(line.added_at().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert_eq!(cart.total_quantity(), 3);
}

#[test]
fn test_unusable_entries_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    write_slot(
        &path,
        r#"{"pump-1":{"name":"Pump A","quantity":0},"pump-2":{"name":"Pump B","quantity":1},"pump-3":"nope"}"#,
    );

    let state = open(&path);
    let lines = state.store().lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].display_name(), "Pump B");
}

#[test]
fn test_malformed_slot_reads_empty_until_next_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    write_slot(&path, "not json");

    let state = open(&path);
    assert!(state.store().lines().is_empty());
    assert!(!state.panel().fragments().checkout_enabled);
    // Opening does not overwrite the value.
    let storage = FileStorage::new(&path);
    assert_eq!(storage.get_item("cart").unwrap().as_deref(), Some("not json"));

    state.store().add_item(product("pump-1", "Pump A")).unwrap();
    assert_eq!(state.store().total_quantity(), 1);
    assert!(storage.get_item("cart").unwrap().unwrap().starts_with('{'));
}

#[test]
fn test_corrupt_file_is_replaced_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    std::fs::write(&path, "garbage").unwrap();

    let state = open(&path);
    assert!(state.store().lines().is_empty());

    state.store().add_item(product("pump-1", "Pump A")).unwrap();
    let reopened = open(&path);
    assert_eq!(reopened.store().total_quantity(), 1);
}

#[test]
fn test_other_keys_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    let storage = FileStorage::new(&path);
    storage.set_item("theme", "dark").unwrap();

    let state = open(&path);
    state.store().add_item(product("pump-1", "Pump A")).unwrap();
    state.store().clear().unwrap();

    assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
    assert_eq!(storage.get_item("cart").unwrap().as_deref(), Some("{}"));
}
