//! Error types for the context store.
//!
//! [`StoreError`] is returned by every store and identity operation. "Not found"
//! and "not owned" are never errors: those surface as `Ok(false)`, `Ok(None)`,
//! or an empty `Vec`.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store was never opened, or has been closed.
    #[error("context store is not initialized")]
    NotInitialized,

    /// The `(user_id, tenant_id)` pair does not name an existing user.
    #[error("unknown user {user_id} in tenant '{tenant_id}'")]
    UnknownUser { user_id: i64, tenant_id: String },

    /// A required argument was missing or empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Filesystem error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking task running the query panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// `true` for faults of the backing store itself, as opposed to a missing
    /// pool or a rejected request.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(_) | Self::Pool(_) | Self::Serde(_) | Self::Io(_) | Self::Task(_)
        )
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_error_is_persistence_failure() {
        let err = StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.is_persistence_failure());
        assert!(err.to_string().contains("sqlite error"));
    }

    #[test]
    fn not_initialized_is_not_persistence_failure() {
        assert!(!StoreError::NotInitialized.is_persistence_failure());
        assert!(!StoreError::InvalidInput("category".into()).is_persistence_failure());
    }

    #[test]
    fn unknown_user_display_names_tenant() {
        let err = StoreError::UnknownUser {
            user_id: 7,
            tenant_id: "acme".into(),
        };
        assert_eq!(err.to_string(), "unknown user 7 in tenant 'acme'");
    }
}
