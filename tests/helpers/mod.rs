#![allow(dead_code)]

use jean_memory::db;
use jean_memory::identity;
use jean_memory::store::ContextStore;
use rusqlite::Connection;
use std::sync::Arc;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&mut conn).unwrap();
    conn
}

/// Create a user directly on a connection. Returns the user id.
pub fn seed_user(conn: &Connection, tenant_id: &str, external_id: &str) -> i64 {
    identity::create_or_get_user(conn, tenant_id, external_id, None)
        .unwrap()
        .0
}

/// An open in-memory store shared the way the router shares it.
pub fn test_store() -> Arc<ContextStore> {
    Arc::new(ContextStore::open_in_memory().unwrap())
}

/// Create a user through the async store. Returns `(user_id, credential)`.
pub async fn store_user(store: &ContextStore, tenant_id: &str, external_id: &str) -> (i64, String) {
    store
        .create_or_get_user(tenant_id, external_id, None)
        .await
        .unwrap()
}
