//! `SQLite` connection pool, schema, and migrations.
//!
//! Connections are pooled with `r2d2`. The [`PragmaCustomizer`] runs on each new
//! connection so WAL mode, foreign keys, and the busy timeout are always set.

pub mod migrations;
pub mod schema;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u64,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_millis(self.busy_timeout_ms))?;
        Ok(())
    }
}

/// Open (or create) a file-backed pool at the given path, with schema initialized
/// and migrations applied.
pub fn open_pool(path: impl AsRef<Path>, pool_size: u32, busy_timeout_ms: u64) -> Result<ConnectionPool> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = Pool::builder()
        .max_size(pool_size.max(1))
        .connection_timeout(Duration::from_secs(5))
        .connection_customizer(Box::new(PragmaCustomizer { busy_timeout_ms }))
        .build(SqliteConnectionManager::file(path))?;

    initialize(&pool)?;
    tracing::info!(path = %path.display(), pool_size, "database initialized");
    Ok(pool)
}

/// Open an in-memory pool.
///
/// Every `SQLite` in-memory connection is its own database, so the pool holds
/// exactly one connection and never recycles it.
pub fn open_memory_pool() -> Result<ConnectionPool> {
    let pool = Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(Duration::from_secs(5))
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: 5000,
        }))
        .build(SqliteConnectionManager::memory())?;

    initialize(&pool)?;
    Ok(pool)
}

fn initialize(pool: &ConnectionPool) -> Result<()> {
    let mut conn = pool.get()?;
    schema::init_schema(&conn)?;
    migrations::run_migrations(&mut conn)?;
    Ok(())
}
