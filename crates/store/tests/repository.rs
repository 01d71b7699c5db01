//! Integration tests for the repository over the in-memory backend.
//!
//! Verifies:
//! - the insert/update/fetch/list/soft-delete lifecycle end to end
//! - constraint violations arriving as field-level conflict stacks
//! - contract breaches rejected before any backend work
//! - out-of-band history (ratings, inventory) winning on the next read

use std::sync::Arc;

use wares_catalog::{CategoryValue, InventoryStatus, Item, ItemDraft};
use wares_core::{Identifier, STATUS_CONFLICT};
use wares_store::{InMemoryBackend, ItemRepository, StoreError};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn backend_with_category() -> (Arc<InMemoryBackend>, i64) {
    let backend = Arc::new(InMemoryBackend::new());
    let category = backend.add_category("Accessories").unwrap();
    (backend, category)
}

fn draft(code: &str, category_id: i64) -> ItemDraft {
    ItemDraft {
        code: code.to_string(),
        name: "Wireless Mouse".to_string(),
        description: "Compact wireless mouse.".to_string(),
        category: Some(CategoryValue::Reference(category_id)),
        quantity: 24,
        price: 19.99,
        ..ItemDraft::default()
    }
}

fn item(code: &str, category_id: i64) -> Item {
    Item::new(draft(code, category_id)).unwrap()
}

fn conflict_stack(error: StoreError) -> wares_core::FieldErrorStack {
    match error {
        StoreError::Conflict(stack) => stack,
        other => panic!("Expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn insert_returns_a_fresh_clean_item_and_leaves_the_argument_alone() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());
    let mut local = item("ACC-100", category);

    let fresh = repository.insert_new(&local).await.unwrap();

    assert!(fresh.is_persisted());
    assert!(!fresh.is_dirty());
    assert_eq!(fresh.code(), "ACC-100");
    assert_eq!(fresh.price(), 19.99);
    assert_eq!(fresh.quantity(), 24);
    assert_eq!(fresh.rating(), 0);
    assert_eq!(fresh.inventory_status(), InventoryStatus::InStock);
    assert_eq!(fresh.category_name(), Some("Accessories"));

    // The argument is untouched until the caller merges.
    assert!(!local.is_persisted());
    let id = fresh.id().unwrap();
    local.replace_with(fresh);
    assert_eq!(local.id(), Some(id));
    assert!(!local.is_dirty());
}

#[tokio::test]
async fn duplicate_code_surfaces_as_a_conflict_stack() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());
    repository.insert_new(&item("ACC-100", category)).await.unwrap();

    let err = repository
        .insert_new(&item("ACC-100", category))
        .await
        .unwrap_err();

    let stack = conflict_stack(err);
    assert_eq!(stack.description(), "Conflicting Item");
    assert_eq!(stack.status(), STATUS_CONFLICT);
    assert_eq!(stack.errors().len(), 1);
    assert_eq!(stack.errors()[0].field(), "item.code");
    assert_eq!(stack.errors()[0].message(), "Duplicate value for code.");
    assert_eq!(
        stack.to_string(),
        "Conflicting Item: item.code: Duplicate value for code."
    );
}

#[tokio::test]
async fn missing_category_surfaces_as_a_conflict_stack() {
    init_tracing();
    let (backend, _) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());

    let err = repository.insert_new(&item("ACC-100", 999)).await.unwrap_err();

    let stack = conflict_stack(err);
    assert_eq!(stack.errors()[0].field(), "item.categoryId");
    assert_eq!(stack.errors()[0].message(), "Item Category does not exist.");
}

#[tokio::test]
async fn read_only_items_are_rejected_before_any_backend_work() {
    init_tracing();
    let backend = Arc::new(InMemoryBackend::new());
    let repository = ItemRepository::new(backend.clone());
    let display_only = Item::new(ItemDraft {
        category: Some(CategoryValue::Name("Imported".to_string())),
        ..draft("ACC-100", 0)
    })
    .unwrap();
    assert!(display_only.is_read_only());

    let err = repository.insert_new(&display_only).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot persist a read-only item.");

    let err = repository.update_existing(&display_only).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot persist a read-only item.");
}

#[tokio::test]
async fn insert_routes_persisted_items_to_update() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());
    let mut current = repository.insert_new(&item("ACC-100", category)).await.unwrap();

    current.set_price(24.5).unwrap();
    let updated = repository.insert_new(&current).await.unwrap();

    assert_eq!(updated.id(), current.id());
    assert_eq!(updated.price(), 24.5);
    assert!(!updated.is_dirty());
}

#[tokio::test]
async fn update_requires_persistence_and_pending_changes() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());

    let never_persisted = item("ACC-100", category);
    let err = repository.update_existing(&never_persisted).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Update called on an item that was never persisted."
    );

    let clean = repository.insert_new(&never_persisted).await.unwrap();
    let err = repository.update_existing(&clean).await.unwrap_err();
    assert_eq!(err.to_string(), "Update called on item without updates.");

    // The not-dirty check fires before any backend call: an id the backend
    // has never seen still gets the contract error, not "Item not found.".
    let mut phantom = item("ACC-900", category);
    phantom.set_id(Some(Identifier::new(999).unwrap()));
    let err = repository.update_existing(&phantom).await.unwrap_err();
    assert_eq!(err.to_string(), "Update called on item without updates.");
}

#[tokio::test]
async fn sparse_update_leaves_clean_fields_alone() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());
    let mut current = repository.insert_new(&item("ACC-100", category)).await.unwrap();

    current.set_name("Ergonomic Mouse").unwrap();
    current.set_price(24.5).unwrap();
    let updated = repository.update_existing(&current).await.unwrap();

    assert_eq!(updated.name(), "Ergonomic Mouse");
    assert_eq!(updated.price(), 24.5);
    assert_eq!(updated.code(), "ACC-100");
    assert_eq!(updated.description(), "Compact wireless mouse.");
    assert_eq!(updated.quantity(), 24);
    assert!(!updated.is_dirty());
}

#[tokio::test]
async fn updating_to_an_occupied_code_conflicts() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());
    repository.insert_new(&item("ACC-100", category)).await.unwrap();
    let mut second = repository.insert_new(&item("ACC-200", category)).await.unwrap();

    second.set_code("ACC-100").unwrap();
    let err = repository.update_existing(&second).await.unwrap_err();

    let stack = conflict_stack(err);
    assert_eq!(stack.errors()[0].field(), "item.code");
    assert_eq!(stack.errors()[0].message(), "Duplicate value for code.");
}

#[tokio::test]
async fn out_of_band_history_wins_on_the_next_read() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());
    let current = repository.insert_new(&item("ACC-100", category)).await.unwrap();
    let id = current.id().unwrap();

    backend.record_rating(id.get(), 4).unwrap();
    backend.record_inventory(id.get(), 3).unwrap();

    let fresh = repository.fetch_by_id(id).await.unwrap().unwrap();
    assert_eq!(fresh.rating(), 4);
    assert_eq!(fresh.quantity(), 3);
    assert_eq!(fresh.inventory_status(), InventoryStatus::LowStock);
    assert!(!fresh.is_dirty());
}

#[tokio::test]
async fn fetch_of_an_unknown_id_is_none() {
    init_tracing();
    let (backend, _) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());

    let found = repository
        .fetch_by_id(Identifier::new(999).unwrap())
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn list_returns_live_items_ordered_by_id() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());
    let first = repository.insert_new(&item("ACC-100", category)).await.unwrap();
    let second = repository.insert_new(&item("ACC-200", category)).await.unwrap();
    let third = repository.insert_new(&item("ACC-300", category)).await.unwrap();

    repository.soft_delete(second.id().unwrap()).await.unwrap();

    let items = repository.list().await.unwrap();
    let ids: Vec<_> = items.iter().map(|entry| entry.id()).collect();
    assert_eq!(ids, vec![first.id(), third.id()]);
    assert!(items.iter().all(|entry| !entry.is_dirty()));
}

#[tokio::test]
async fn soft_delete_hides_the_item_and_then_conflicts() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());
    let current = repository.insert_new(&item("ACC-100", category)).await.unwrap();
    let id = current.id().unwrap();

    repository.soft_delete(id).await.unwrap();
    assert!(repository.fetch_by_id(id).await.unwrap().is_none());

    let err = repository.soft_delete(id).await.unwrap_err();
    let stack = conflict_stack(err);
    assert_eq!(stack.status(), STATUS_CONFLICT);
    assert_eq!(stack.errors()[0].field(), "item.id");
    assert_eq!(stack.errors()[0].message(), "Item not found.");
}

#[tokio::test]
async fn updating_a_deleted_item_reports_it_missing() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = ItemRepository::new(backend.clone());
    let mut current = repository.insert_new(&item("ACC-100", category)).await.unwrap();

    repository.soft_delete(current.id().unwrap()).await.unwrap();

    current.set_name("Renamed").unwrap();
    let err = repository.update_existing(&current).await.unwrap_err();
    let stack = conflict_stack(err);
    assert_eq!(stack.errors()[0].field(), "item.id");
    assert_eq!(stack.errors()[0].message(), "Item not found.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_duplicate_inserts_admit_exactly_one_winner() {
    init_tracing();
    let (backend, category) = backend_with_category();
    let repository = Arc::new(ItemRepository::new(backend.clone()));

    let mut handles = Vec::new();
    for _ in 0..2 {
        let repository = repository.clone();
        let contender = item("ACC-100", category);
        handles.push(tokio::spawn(
            async move { repository.insert_new(&contender).await },
        ));
    }

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(fresh) => {
                assert!(fresh.is_persisted());
                winners += 1;
            }
            Err(StoreError::Conflict(stack)) => {
                assert_eq!(stack.errors()[0].field(), "item.code");
                conflicts += 1;
            }
            Err(other) => panic!("Expected Conflict, got {other:?}"),
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 1);
}
