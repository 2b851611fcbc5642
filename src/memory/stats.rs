use rusqlite::{params, Connection};

use super::types::CategoryCount;
use crate::error::Result;

/// Entry counts per category for one tenant-scoped user, largest bank first.
pub fn count_by_category(conn: &Connection, user_id: i64, tenant_id: &str) -> Result<Vec<CategoryCount>> {
    let mut stmt = conn.prepare(
        "SELECT context_type, COUNT(*), MAX(updated_at) FROM context_entries \
         WHERE tenant_id = ?1 AND user_id = ?2 \
         GROUP BY context_type ORDER BY COUNT(*) DESC, context_type ASC",
    )?;

    let counts = stmt
        .query_map(params![tenant_id, user_id], |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                entries: row.get::<_, i64>(1)? as u64,
                last_updated: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(counts)
}
