//! Lexical search over serialized entry content.
//!
//! A case-insensitive substring filter, not a ranking engine: matches come back
//! in `updated_at DESC` order. Lowercasing happens in Rust rather than with
//! `SQLite`'s `lower()`, which only folds ASCII.

use rusqlite::{params, Connection};

use super::types::ContextEntry;
use super::{EntryRow, ENTRY_COLUMNS};
use crate::error::Result;

/// Default number of results for [`search_entries`].
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Entries in `category` whose serialized content contains `text`,
/// ignoring case. An empty `text` matches every entry.
pub fn search_entries(
    conn: &Connection,
    user_id: i64,
    tenant_id: &str,
    category: &str,
    text: &str,
    limit: usize,
) -> Result<Vec<ContextEntry>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let needle = text.to_lowercase();

    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM context_entries \
         WHERE tenant_id = ?1 AND user_id = ?2 AND context_type = ?3 \
         ORDER BY updated_at DESC, id DESC"
    ))?;
    let mut rows = stmt.query(params![tenant_id, user_id, category])?;

    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        let entry = EntryRow::from_row(row)?;
        if entry.content_text().to_lowercase().contains(&needle) {
            results.push(entry.into_entry()?);
            if results.len() >= limit {
                break;
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::upsert_entry;
    use crate::memory::types::NewEntry;
    use serde_json::json;

    fn test_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        crate::db::migrations::run_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO users (tenant_id, external_id, api_key, created_at) VALUES ('t1', 'g1', 'k1', 'now')",
            [],
        )
        .unwrap();
        conn
    }

    fn store(conn: &mut Connection, key: &str, content: serde_json::Value) {
        upsert_entry(
            conn,
            &NewEntry {
                user_id: 1,
                tenant_id: "t1",
                category: "notes",
                content: &content,
                source_key: Some(key),
                metadata: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_case_insensitive_match() {
        let mut conn = test_db();
        store(&mut conn, "a", json!({"title": "Quarterly Planning"}));
        store(&mut conn, "b", json!({"title": "grocery list"}));

        let hits = search_entries(&conn, 1, "t1", "notes", "PLANNING", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source_key, "a");
    }

    #[test]
    fn test_non_ascii_case_folding() {
        let mut conn = test_db();
        store(&mut conn, "a", json!({"city": "München"}));

        let hits = search_entries(&conn, 1, "t1", "notes", "MÜNCHEN", 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_limit_is_respected() {
        let mut conn = test_db();
        for key in ["a", "b", "c"] {
            store(&mut conn, key, json!({"text": "rust"}));
        }

        assert_eq!(search_entries(&conn, 1, "t1", "notes", "rust", 2).unwrap().len(), 2);
        assert!(search_entries(&conn, 1, "t1", "notes", "rust", 0).unwrap().is_empty());
    }

    #[test]
    fn test_no_match_returns_empty() {
        let mut conn = test_db();
        store(&mut conn, "a", json!({"title": "x"}));
        assert!(search_entries(&conn, 1, "t1", "notes", "zebra", 10).unwrap().is_empty());
    }
}
