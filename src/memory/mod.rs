pub mod forget;
pub mod search;
pub mod stats;
pub mod store;
pub mod types;

use rusqlite::Row;

use crate::error::Result;
use types::ContextEntry;

/// Column list shared by every query that hydrates a [`ContextEntry`].
pub(crate) const ENTRY_COLUMNS: &str = "id, user_id, tenant_id, context_type, source_identifier, \
                                        content, metadata, created_at, updated_at";

/// Current time as fixed-width RFC 3339 (microseconds, `Z`), so that textual
/// order matches chronological order.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Raw row with JSON columns still serialized.
pub(crate) struct EntryRow {
    id: i64,
    user_id: i64,
    tenant_id: String,
    category: String,
    source_key: String,
    content: String,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl EntryRow {
    /// Read a row selected with [`ENTRY_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            tenant_id: row.get(2)?,
            category: row.get(3)?,
            source_key: row.get(4)?,
            content: row.get(5)?,
            metadata: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    /// The serialized `content` column, as searched by substring match.
    pub(crate) fn content_text(&self) -> &str {
        &self.content
    }

    pub(crate) fn into_entry(self) -> Result<ContextEntry> {
        Ok(ContextEntry {
            id: self.id,
            user_id: self.user_id,
            tenant_id: self.tenant_id,
            category: self.category,
            source_key: self.source_key,
            content: serde_json::from_str(&self.content)?,
            metadata: serde_json::from_str(&self.metadata)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_fixed_width_and_ordered() {
        let a = now_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = now_timestamp();
        assert_eq!(a.len(), b.len());
        assert!(a.ends_with('Z'));
        assert!(b > a);
    }
}
