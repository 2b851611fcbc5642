//! Core record types.
//!
//! Defines [`ContextEntry`] (one stored piece of context), [`NewEntry`] (the
//! borrowed write request), and [`UpsertResult`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A context record, matching the `context_entries` table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Surrogate key assigned by the store.
    pub id: i64,
    pub user_id: i64,
    pub tenant_id: String,
    /// Memory bank this entry belongs to (e.g. `"notes"`, `"user_preference"`).
    #[serde(rename = "context_type")]
    pub category: String,
    /// Origin of the entry within its category (file path, conversation id, ...).
    #[serde(rename = "source_identifier")]
    pub source_key: String,
    pub content: Value,
    /// Tags and annotations. `{}` when none were supplied.
    pub metadata: Value,
    /// RFC 3339 creation timestamp, preserved across updates.
    pub created_at: String,
    /// RFC 3339 timestamp of the last write.
    pub updated_at: String,
}

/// A write request for [`upsert_entry`](super::store::upsert_entry).
#[derive(Debug, Clone, Copy)]
pub struct NewEntry<'a> {
    pub user_id: i64,
    pub tenant_id: &'a str,
    pub category: &'a str,
    pub content: &'a Value,
    /// `None` makes the store generate a unique synthetic key.
    pub source_key: Option<&'a str>,
    pub metadata: Option<&'a Value>,
}

/// Result returned from an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertResult {
    pub id: i64,
    /// The key the entry was stored under, generated if none was supplied.
    pub source_key: String,
    /// `true` if a new row was inserted, `false` if an existing one was replaced.
    pub created: bool,
}

/// Per-category entry count for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub entries: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}
