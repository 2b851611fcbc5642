mod helpers;

use helpers::{store_user, test_store};
use jean_memory::error::StoreError;
use serde_json::json;

#[tokio::test]
async fn reads_under_other_tenant_are_empty() {
    let store = test_store();
    let (user, _) = store_user(&store, "t1", "google-1").await;

    store
        .upsert(user, "t1", "notes", json!({"title": "secret plans"}), Some("n1"), None)
        .await
        .unwrap();

    assert_eq!(store.get(user, "t1", "notes", None, None).await.unwrap().len(), 1);

    // Same user id, wrong tenant: the row exists but must not be visible.
    assert!(store.get(user, "t2", "notes", None, None).await.unwrap().is_empty());
    assert!(store.get(user, "t2", "notes", Some("n1"), None).await.unwrap().is_empty());
    assert!(store.search(user, "t2", "notes", "secret", 10).await.unwrap().is_empty());
    assert!(store.list_categories(user, "t2").await.unwrap().is_empty());
}

#[tokio::test]
async fn point_lookup_under_other_tenant_is_none() {
    let store = test_store();
    let (user, _) = store_user(&store, "t1", "google-1").await;
    let stored = store
        .upsert(user, "t1", "notes", json!({"title": "x"}), Some("n1"), None)
        .await
        .unwrap();

    assert!(store.get_by_id(user, "t1", stored.id).await.unwrap().is_some());
    assert!(store.get_by_id(user, "t2", stored.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deletes_under_other_tenant_touch_nothing() {
    let store = test_store();
    let (user, _) = store_user(&store, "t1", "google-1").await;
    let stored = store
        .upsert(user, "t1", "notes", json!({"title": "keep me"}), Some("n1"), None)
        .await
        .unwrap();

    assert!(!store.delete_by_id(user, "t2", stored.id).await.unwrap());
    assert_eq!(store.delete_category(user, "t2", "notes").await.unwrap(), 0);
    assert_eq!(store.delete_user(user, "t2").await.unwrap(), 0);

    let remaining = store.get(user, "t1", "notes", None, None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].content, json!({"title": "keep me"}));
}

#[tokio::test]
async fn writes_under_other_tenant_are_rejected() {
    let store = test_store();
    let (user, _) = store_user(&store, "t1", "google-1").await;

    let err = store
        .upsert(user, "t2", "notes", json!({"title": "x"}), Some("n1"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownUser { .. }));
    assert!(!err.is_persistence_failure());
}

#[tokio::test]
async fn users_in_different_tenants_do_not_see_each_other() {
    let store = test_store();
    let (alice, _) = store_user(&store, "t1", "google-1").await;
    let (bob, _) = store_user(&store, "t2", "google-1").await;
    assert_ne!(alice, bob);

    store
        .upsert(alice, "t1", "values", json!({"key": "diet", "value": "vegan"}), Some("diet"), None)
        .await
        .unwrap();
    store
        .upsert(bob, "t2", "values", json!({"key": "diet", "value": "omnivore"}), Some("diet"), None)
        .await
        .unwrap();

    let alice_values = store.get(alice, "t1", "values", None, None).await.unwrap();
    assert_eq!(alice_values.len(), 1);
    assert_eq!(alice_values[0].content["value"], "vegan");

    assert!(store.get(bob, "t1", "values", None, None).await.unwrap().is_empty());
    assert!(store.get(alice, "t2", "values", None, None).await.unwrap().is_empty());
}
