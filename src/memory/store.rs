//! Write path and point reads.
//!
//! [`upsert_entry`] is the single write entry point. It runs inside an immediate
//! transaction: owner check, conflict-resolving insert keyed on
//! `(tenant_id, user_id, context_type, source_identifier)`, and returns whether
//! a row was created or replaced.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;

use super::types::{ContextEntry, NewEntry, UpsertResult};
use super::{now_timestamp, EntryRow, ENTRY_COLUMNS};
use crate::error::{Result, StoreError};

/// Insert a new entry, or replace `content`/`metadata` of the entry with the same
/// `(tenant, user, category, source_key)` tuple. `id` and `created_at` survive
/// an update; `updated_at` is refreshed on every write.
pub fn upsert_entry(conn: &mut Connection, entry: &NewEntry<'_>) -> Result<UpsertResult> {
    validate(entry)?;

    let source_key = match entry.source_key {
        Some(key) => key.to_string(),
        None => synthetic_source_key(entry.category),
    };
    let content_json = serde_json::to_string(entry.content)?;
    let metadata_json = match entry.metadata {
        Some(m) => serde_json::to_string(m)?,
        None => "{}".to_string(),
    };
    let now = now_timestamp();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if !user_exists(&tx, entry.user_id, entry.tenant_id)? {
        return Err(StoreError::UnknownUser {
            user_id: entry.user_id,
            tenant_id: entry.tenant_id.to_string(),
        });
    }

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM context_entries \
             WHERE tenant_id = ?1 AND user_id = ?2 AND context_type = ?3 AND source_identifier = ?4",
            params![entry.tenant_id, entry.user_id, entry.category, source_key],
            |row| row.get(0),
        )
        .optional()?;

    let id: i64 = tx.query_row(
        "INSERT INTO context_entries \
             (user_id, tenant_id, context_type, source_identifier, content, metadata, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) \
         ON CONFLICT (tenant_id, user_id, context_type, source_identifier) DO UPDATE SET \
             content = excluded.content, \
             metadata = excluded.metadata, \
             updated_at = excluded.updated_at \
         RETURNING id",
        params![
            entry.user_id,
            entry.tenant_id,
            entry.category,
            source_key,
            content_json,
            metadata_json,
            now,
        ],
        |row| row.get(0),
    )?;

    tx.commit()?;

    Ok(UpsertResult {
        id,
        source_key,
        created: existing.is_none(),
    })
}

/// Entries in one category, most recently updated first. With `source_key`,
/// at most the single matching entry. `limit = None` means unbounded.
pub fn get_entries(
    conn: &Connection,
    user_id: i64,
    tenant_id: &str,
    category: &str,
    source_key: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<ContextEntry>> {
    let limit = sql_limit(limit);

    let rows: Vec<EntryRow> = match source_key {
        Some(key) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM context_entries \
                 WHERE tenant_id = ?1 AND user_id = ?2 AND context_type = ?3 AND source_identifier = ?4 \
                 ORDER BY updated_at DESC, id DESC LIMIT ?5"
            ))?;
            let rows = stmt
                .query_map(
                    params![tenant_id, user_id, category, key, limit],
                    EntryRow::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM context_entries \
                 WHERE tenant_id = ?1 AND user_id = ?2 AND context_type = ?3 \
                 ORDER BY updated_at DESC, id DESC LIMIT ?4"
            ))?;
            let rows = stmt
                .query_map(params![tenant_id, user_id, category, limit], EntryRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };

    rows.into_iter().map(EntryRow::into_entry).collect()
}

/// Fetch one entry by id, only if it belongs to `(tenant_id, user_id)`.
pub fn get_entry_by_id(
    conn: &Connection,
    user_id: i64,
    tenant_id: &str,
    id: i64,
) -> Result<Option<ContextEntry>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM context_entries \
                 WHERE id = ?1 AND tenant_id = ?2 AND user_id = ?3"
            ),
            params![id, tenant_id, user_id],
            EntryRow::from_row,
        )
        .optional()?;

    row.map(EntryRow::into_entry).transpose()
}

/// `true` if `user_id` exists inside `tenant_id`.
pub(crate) fn user_exists(conn: &Connection, user_id: i64, tenant_id: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE user_id = ?1 AND tenant_id = ?2",
        params![user_id, tenant_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// `LIMIT -1` is unbounded in `SQLite`.
pub(crate) fn sql_limit(limit: Option<usize>) -> i64 {
    limit
        .and_then(|l| i64::try_from(l).ok())
        .unwrap_or(-1)
}

/// Unique key for entries written without a natural source key.
fn synthetic_source_key(category: &str) -> String {
    format!("{category}_{}", uuid::Uuid::now_v7())
}

fn validate(entry: &NewEntry<'_>) -> Result<()> {
    if entry.tenant_id.trim().is_empty() {
        return Err(StoreError::InvalidInput("tenant_id must not be empty".into()));
    }
    if entry.category.trim().is_empty() {
        return Err(StoreError::InvalidInput("category must not be empty".into()));
    }
    if is_empty_content(entry.content) {
        return Err(StoreError::InvalidInput("content must not be empty".into()));
    }
    if matches!(entry.source_key, Some(key) if key.is_empty()) {
        return Err(StoreError::InvalidInput("source_key must not be empty when given".into()));
    }
    Ok(())
}

fn is_empty_content(content: &Value) -> bool {
    match content {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        crate::db::migrations::run_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO users (tenant_id, external_id, api_key, created_at) VALUES ('t1', 'g1', 'k1', ?1)",
            [now_timestamp()],
        )
        .unwrap();
        conn
    }

    fn note<'a>(content: &'a Value, source_key: Option<&'a str>) -> NewEntry<'a> {
        NewEntry {
            user_id: 1,
            tenant_id: "t1",
            category: "notes",
            content,
            source_key,
            metadata: None,
        }
    }

    #[test]
    fn test_insert_then_update_same_key() {
        let mut conn = test_db();

        let first = upsert_entry(&mut conn, &note(&json!({"title": "x"}), Some("n1"))).unwrap();
        assert!(first.created);

        let second = upsert_entry(&mut conn, &note(&json!({"title": "y"}), Some("n1"))).unwrap();
        assert!(!second.created);
        assert_eq!(second.id, first.id);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM context_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_missing_source_key_never_merges() {
        let mut conn = test_db();
        let content = json!({"title": "same"});

        let a = upsert_entry(&mut conn, &note(&content, None)).unwrap();
        let b = upsert_entry(&mut conn, &note(&content, None)).unwrap();

        assert!(a.created && b.created);
        assert_ne!(a.source_key, b.source_key);
        assert!(a.source_key.starts_with("notes_"));
    }

    #[test]
    fn test_metadata_defaults_to_empty_object() {
        let mut conn = test_db();
        upsert_entry(&mut conn, &note(&json!({"title": "x"}), Some("n1"))).unwrap();

        let entries = get_entries(&conn, 1, "t1", "notes", Some("n1"), None).unwrap();
        assert_eq!(entries[0].metadata, json!({}));
    }

    #[test]
    fn test_unknown_user_is_rejected() {
        let mut conn = test_db();
        let content = json!({"title": "x"});
        let mut entry = note(&content, Some("n1"));
        entry.tenant_id = "t2";

        let err = upsert_entry(&mut conn, &entry).unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser { user_id: 1, .. }));
    }

    #[test]
    fn test_empty_content_is_rejected() {
        let mut conn = test_db();
        for content in [Value::Null, json!({}), json!("")] {
            let err = upsert_entry(&mut conn, &note(&content, Some("n1"))).unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_get_orders_most_recent_first_and_limits() {
        let mut conn = test_db();
        for key in ["a", "b", "c"] {
            upsert_entry(&mut conn, &note(&json!({"key": key}), Some(key))).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let entries = get_entries(&conn, 1, "t1", "notes", None, Some(2)).unwrap();
        let keys: Vec<&str> = entries.iter().map(|e| e.source_key.as_str()).collect();
        assert_eq!(keys, vec!["c", "b"]);
    }

    #[test]
    fn test_get_by_id_checks_owner() {
        let mut conn = test_db();
        let stored = upsert_entry(&mut conn, &note(&json!({"title": "x"}), Some("n1"))).unwrap();

        assert!(get_entry_by_id(&conn, 1, "t1", stored.id).unwrap().is_some());
        assert!(get_entry_by_id(&conn, 1, "t2", stored.id).unwrap().is_none());
        assert!(get_entry_by_id(&conn, 2, "t1", stored.id).unwrap().is_none());
    }
}
