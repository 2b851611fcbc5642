//! Async, tenant-isolated facade over the pooled database.
//!
//! [`ContextStore`] owns the connection pool. Every operation checks that the
//! pool is open, acquires one connection, runs its synchronous SQL on
//! `tokio::task::spawn_blocking`, and releases the connection on completion.
//! There are no cross-operation transactions.

use serde_json::Value;
use std::path::Path;
use std::sync::RwLock;

use crate::config::StorageConfig;
use crate::db::{self, ConnectionPool};
use crate::error::{Result, StoreError};
use crate::memory::search::search_entries;
use crate::memory::types::{CategoryCount, ContextEntry, NewEntry, UpsertResult};
use crate::memory::{forget, stats, store};

/// Tenant-and-user scoped store of [`ContextEntry`] records.
pub struct ContextStore {
    pool: RwLock<Option<ConnectionPool>>,
}

impl ContextStore {
    /// A store with no pool. Every operation fails with [`StoreError::NotInitialized`]
    /// until a pool is attached with [`ContextStore::from_pool`].
    pub fn unopened() -> Self {
        Self {
            pool: RwLock::new(None),
        }
    }

    pub fn from_pool(pool: ConnectionPool) -> Self {
        Self {
            pool: RwLock::new(Some(pool)),
        }
    }

    /// Open the file-backed store described by `config`.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let path = crate::config::expand_tilde(&config.db_path);
        Self::open_path(&path, config.pool_size, config.busy_timeout_ms)
    }

    pub fn open_path(path: &Path, pool_size: u32, busy_timeout_ms: u64) -> Result<Self> {
        let pool = db::open_pool(path, pool_size, busy_timeout_ms)?;
        Ok(Self::from_pool(pool))
    }

    /// Open a private in-memory store (tests, dry runs).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_pool(db::open_memory_pool()?))
    }

    /// Drop the pool. Outstanding connections close when their operations finish.
    pub fn close(&self) {
        let mut guard = match self.pool.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.take().is_some() {
            tracing::info!("context store closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.pool.read().map(|p| p.is_some()).unwrap_or(false)
    }

    fn pool(&self) -> Result<ConnectionPool> {
        let guard = self
            .pool
            .read()
            .map_err(|e| StoreError::Task(format!("pool lock poisoned: {e}")))?;
        guard.clone().ok_or(StoreError::NotInitialized)
    }

    /// Run `op` against one pooled connection on the blocking thread pool.
    pub(crate) async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool()?;
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            op(&mut *conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Schema version recorded in the open database.
    pub async fn schema_version(&self) -> Result<u32> {
        self.with_conn(|conn| Ok(db::migrations::get_schema_version(conn)?))
            .await
            .inspect_err(|e| log_failure("schema_version", "-", None, e))
    }

    /// Insert or replace the entry keyed by `(tenant_id, user_id, category, source_key)`.
    /// `Err` always means "not stored".
    pub async fn upsert(
        &self,
        user_id: i64,
        tenant_id: &str,
        category: &str,
        content: Value,
        source_key: Option<&str>,
        metadata: Option<Value>,
    ) -> Result<UpsertResult> {
        let tenant = tenant_id.to_string();
        let cat = category.to_string();
        let key = source_key.map(str::to_string);

        let result = self
            .with_conn(move |conn| {
                store::upsert_entry(
                    conn,
                    &NewEntry {
                        user_id,
                        tenant_id: &tenant,
                        category: &cat,
                        content: &content,
                        source_key: key.as_deref(),
                        metadata: metadata.as_ref(),
                    },
                )
            })
            .await;

        match &result {
            Ok(stored) => tracing::info!(
                user_id,
                tenant = %tenant_id,
                category = %category,
                id = stored.id,
                created = stored.created,
                "stored context entry"
            ),
            Err(e) => log_failure("upsert", tenant_id, Some(category), e),
        }
        result
    }

    /// Entries in `category`, most recently updated first.
    pub async fn get(
        &self,
        user_id: i64,
        tenant_id: &str,
        category: &str,
        source_key: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ContextEntry>> {
        let tenant = tenant_id.to_string();
        let cat = category.to_string();
        let key = source_key.map(str::to_string);

        self.with_conn(move |conn| {
            store::get_entries(conn, user_id, &tenant, &cat, key.as_deref(), limit)
        })
        .await
        .inspect_err(|e| log_failure("get", tenant_id, Some(category), e))
    }

    /// Owner-checked point lookup.
    pub async fn get_by_id(&self, user_id: i64, tenant_id: &str, id: i64) -> Result<Option<ContextEntry>> {
        let tenant = tenant_id.to_string();
        self.with_conn(move |conn| store::get_entry_by_id(conn, user_id, &tenant, id))
            .await
            .inspect_err(|e| log_failure("get_by_id", tenant_id, None, e))
    }

    /// Case-insensitive substring search over serialized content.
    pub async fn search(
        &self,
        user_id: i64,
        tenant_id: &str,
        category: &str,
        text: &str,
        limit: usize,
    ) -> Result<Vec<ContextEntry>> {
        let tenant = tenant_id.to_string();
        let cat = category.to_string();
        let needle = text.to_string();

        self.with_conn(move |conn| search_entries(conn, user_id, &tenant, &cat, &needle, limit))
            .await
            .inspect_err(|e| log_failure("search", tenant_id, Some(category), e))
    }

    /// Delete one owned entry. `Ok(false)` when missing or owned by someone else.
    pub async fn delete_by_id(&self, user_id: i64, tenant_id: &str, id: i64) -> Result<bool> {
        let tenant = tenant_id.to_string();
        let deleted = self
            .with_conn(move |conn| forget::delete_entry(conn, user_id, &tenant, id))
            .await
            .inspect_err(|e| log_failure("delete_by_id", tenant_id, None, e))?;

        if deleted {
            tracing::info!(user_id, tenant = %tenant_id, id, "deleted context entry");
        } else {
            tracing::warn!(user_id, tenant = %tenant_id, id, "entry not found or not owned");
        }
        Ok(deleted)
    }

    /// Wipe one memory bank. Returns the number of entries removed.
    pub async fn delete_category(&self, user_id: i64, tenant_id: &str, category: &str) -> Result<usize> {
        let tenant = tenant_id.to_string();
        let cat = category.to_string();
        let removed = self
            .with_conn(move |conn| forget::delete_category(conn, user_id, &tenant, &cat))
            .await
            .inspect_err(|e| log_failure("delete_category", tenant_id, Some(category), e))?;

        tracing::info!(user_id, tenant = %tenant_id, category = %category, removed, "cleared category");
        Ok(removed)
    }

    /// Erase every entry owned by the tenant-scoped user.
    pub async fn delete_user(&self, user_id: i64, tenant_id: &str) -> Result<usize> {
        let tenant = tenant_id.to_string();
        let removed = self
            .with_conn(move |conn| forget::delete_user_entries(conn, user_id, &tenant))
            .await
            .inspect_err(|e| log_failure("delete_user", tenant_id, None, e))?;

        tracing::info!(user_id, tenant = %tenant_id, removed, "erased user context");
        Ok(removed)
    }

    /// Entry counts per category for the user.
    pub async fn list_categories(&self, user_id: i64, tenant_id: &str) -> Result<Vec<CategoryCount>> {
        let tenant = tenant_id.to_string();
        self.with_conn(move |conn| stats::count_by_category(conn, user_id, &tenant))
            .await
            .inspect_err(|e| log_failure("list_categories", tenant_id, None, e))
    }
}

pub(crate) fn log_failure(operation: &str, tenant_id: &str, category: Option<&str>, err: &StoreError) {
    match err {
        StoreError::NotInitialized => {
            tracing::error!(operation, tenant = %tenant_id, "store used before open or after close");
        }
        StoreError::UnknownUser { .. } | StoreError::InvalidInput(_) => {
            tracing::warn!(operation, tenant = %tenant_id, category = ?category, error = %err, "request rejected");
        }
        _ => {
            tracing::error!(operation, tenant = %tenant_id, category = ?category, error = %err, "persistence failure");
        }
    }
}
