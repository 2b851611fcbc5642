mod helpers;

use helpers::{store_user, test_store};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let store = test_store();
    let (user, _) = store_user(&store, "t1", "google-1").await;
    store
        .upsert(user, "t1", "notes", json!({"title": "Rust Ownership Notes"}), Some("a"), None)
        .await
        .unwrap();
    store
        .upsert(user, "t1", "notes", json!({"title": "Grocery list"}), Some("b"), None)
        .await
        .unwrap();

    let hits = store.search(user, "t1", "notes", "OWNERSHIP", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source_key, "a");

    assert!(store.search(user, "t1", "notes", "kubernetes", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_is_scoped_to_category() {
    let store = test_store();
    let (user, _) = store_user(&store, "t1", "google-1").await;
    store
        .upsert(user, "t1", "tasks", json!({"todo": "write notes"}), Some("a"), None)
        .await
        .unwrap();

    assert!(store.search(user, "t1", "notes", "write", 10).await.unwrap().is_empty());
    assert_eq!(store.search(user, "t1", "tasks", "write", 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn search_orders_recent_first_and_stops_at_limit() {
    let store = test_store();
    let (user, _) = store_user(&store, "t1", "google-1").await;
    for key in ["one", "two", "three"] {
        store
            .upsert(user, "t1", "media", json!({"movie": format!("Alien {key}")}), Some(key), None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let hits = store.search(user, "t1", "media", "alien", 2).await.unwrap();
    let keys: Vec<&str> = hits.iter().map(|e| e.source_key.as_str()).collect();
    assert_eq!(keys, vec!["three", "two"]);
}

#[tokio::test]
async fn search_folds_non_ascii_case() {
    let store = test_store();
    let (user, _) = store_user(&store, "t1", "google-1").await;
    store
        .upsert(user, "t1", "locations", json!({"city": "ÅLESUND"}), Some("a"), None)
        .await
        .unwrap();

    assert_eq!(store.search(user, "t1", "locations", "ålesund", 10).await.unwrap().len(), 1);
}
