//! Owner-checked deletion.
//!
//! Three granularities: one entry by id, one category (memory bank reset), and
//! everything a tenant-scoped user owns (data erasure). Every statement is
//! filtered by both `tenant_id` and `user_id`.

use rusqlite::{params, Connection};

use crate::error::Result;

/// Delete one entry. Returns `false` if it does not exist or is not owned by
/// `(tenant_id, user_id)`.
pub fn delete_entry(conn: &Connection, user_id: i64, tenant_id: &str, id: i64) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM context_entries WHERE id = ?1 AND tenant_id = ?2 AND user_id = ?3",
        params![id, tenant_id, user_id],
    )?;
    Ok(rows > 0)
}

/// Delete every entry in one category. Returns the number of rows removed.
pub fn delete_category(
    conn: &Connection,
    user_id: i64,
    tenant_id: &str,
    category: &str,
) -> Result<usize> {
    let rows = conn.execute(
        "DELETE FROM context_entries WHERE tenant_id = ?1 AND user_id = ?2 AND context_type = ?3",
        params![tenant_id, user_id, category],
    )?;
    Ok(rows)
}

/// Delete every entry owned by the user. The user row itself is kept.
pub fn delete_user_entries(conn: &Connection, user_id: i64, tenant_id: &str) -> Result<usize> {
    let rows = conn.execute(
        "DELETE FROM context_entries WHERE tenant_id = ?1 AND user_id = ?2",
        params![tenant_id, user_id],
    )?;
    Ok(rows)
}
