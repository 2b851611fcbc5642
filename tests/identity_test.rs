mod helpers;

use helpers::test_store;
use jean_memory::identity::Principal;
use serde_json::json;

#[tokio::test]
async fn issuance_is_idempotent_per_tenant_identity() {
    let store = test_store();
    let first = store.create_or_get_user("t1", "google-42", Some("a@example.com")).await.unwrap();
    let again = store.create_or_get_user("t1", "google-42", Some("a@example.com")).await.unwrap();
    assert_eq!(first, again);

    let elsewhere = store.create_or_get_user("t2", "google-42", None).await.unwrap();
    assert_ne!(first.0, elsewhere.0);
    assert_ne!(first.1, elsewhere.1);
}

#[tokio::test]
async fn credential_resolves_to_owning_principal() {
    let store = test_store();
    let (user_id, credential) = store.create_or_get_user("t1", "google-42", None).await.unwrap();

    let principal = store.resolve_credential(&credential).await.unwrap();
    assert_eq!(
        principal,
        Some(Principal {
            user_id,
            tenant_id: "t1".into()
        })
    );
}

#[tokio::test]
async fn unknown_credentials_resolve_to_none() {
    let store = test_store();
    let (_, credential) = store.create_or_get_user("t1", "google-42", None).await.unwrap();

    let upper = credential.to_uppercase();
    let candidates: [&str; 4] = ["", "not-a-key", &credential[..10], &upper];
    for candidate in candidates {
        assert!(
            store.resolve_credential(candidate).await.unwrap().is_none(),
            "{candidate:?} must not resolve"
        );
    }
}

#[tokio::test]
async fn settings_round_trip() {
    let store = test_store();
    let (user_id, _) = store.create_or_get_user("t1", "google-42", Some("a@example.com")).await.unwrap();

    assert!(store.update_settings(user_id, "t1", json!({"summaries": true})).await.unwrap());
    assert!(!store.update_settings(user_id, "t2", json!({"summaries": false})).await.unwrap());

    let user = store.get_user(user_id, "t1").await.unwrap().unwrap();
    assert_eq!(user.external_id, "google-42");
    assert_eq!(user.settings, Some(json!({"summaries": true})));
}
