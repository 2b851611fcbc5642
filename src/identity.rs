//! Identity & access resolution.
//!
//! A user is created on first login of an external identity within a tenant and
//! receives a random credential at that moment; the credential never changes.
//! [`resolve_credential`] has exactly two outcomes: the owning principal, or
//! `None`. There is no default-user fallback for unknown credentials.

use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::memory::now_timestamp;
use crate::store::{log_failure, ContextStore};

/// Number of random bytes in a credential (hex-encoded to twice as many chars).
const CREDENTIAL_BYTES: usize = 32;

/// The `(user_id, tenant_id)` pair a credential resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: i64,
    pub tenant_id: String,
}

/// A user record, without its credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: i64,
    pub tenant_id: String,
    /// Stable federated identity subject (e.g. a Google account id).
    pub external_id: String,
    pub email: Option<String>,
    pub settings: Option<Value>,
    pub created_at: String,
}

/// Return the existing `(user_id, credential)` for `(tenant_id, external_id)`,
/// creating the user with a fresh credential if needed.
pub fn create_or_get_user(
    conn: &Connection,
    tenant_id: &str,
    external_id: &str,
    email: Option<&str>,
) -> Result<(i64, String)> {
    if tenant_id.trim().is_empty() || external_id.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "tenant_id and external_id must not be empty".into(),
        ));
    }

    if let Some(found) = find_user(conn, tenant_id, external_id)? {
        return Ok(found);
    }

    // A concurrent login may insert first; DO NOTHING then re-read the winner.
    conn.execute(
        "INSERT INTO users (tenant_id, external_id, email, api_key, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT (tenant_id, external_id) DO NOTHING",
        params![tenant_id, external_id, email, generate_credential(), now_timestamp()],
    )?;

    find_user(conn, tenant_id, external_id)?
        .ok_or(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

fn find_user(conn: &Connection, tenant_id: &str, external_id: &str) -> Result<Option<(i64, String)>> {
    let found = conn
        .query_row(
            "SELECT user_id, api_key FROM users WHERE tenant_id = ?1 AND external_id = ?2",
            params![tenant_id, external_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(found)
}

/// Look up the principal owning `credential`.
pub fn resolve_credential(conn: &Connection, credential: &str) -> Result<Option<Principal>> {
    if credential.is_empty() {
        return Ok(None);
    }
    let principal = conn
        .query_row(
            "SELECT user_id, tenant_id FROM users WHERE api_key = ?1",
            params![credential],
            |row| {
                Ok(Principal {
                    user_id: row.get(0)?,
                    tenant_id: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(principal)
}

pub fn get_user(conn: &Connection, user_id: i64, tenant_id: &str) -> Result<Option<User>> {
    let row = conn
        .query_row(
            "SELECT user_id, tenant_id, external_id, email, settings, created_at \
             FROM users WHERE user_id = ?1 AND tenant_id = ?2",
            params![user_id, tenant_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, tenant_id, external_id, email, settings, created_at)) = row else {
        return Ok(None);
    };
    let settings = settings.map(|s| serde_json::from_str(&s)).transpose()?;

    Ok(Some(User {
        user_id,
        tenant_id,
        external_id,
        email,
        settings,
        created_at,
    }))
}

/// Replace the user's settings blob. `false` if no such user in the tenant.
pub fn update_settings(conn: &Connection, user_id: i64, tenant_id: &str, settings: &Value) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE users SET settings = ?1 WHERE user_id = ?2 AND tenant_id = ?3",
        params![serde_json::to_string(settings)?, user_id, tenant_id],
    )?;
    Ok(rows > 0)
}

fn generate_credential() -> String {
    let mut bytes = [0u8; CREDENTIAL_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Shortened form for log lines.
fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(5).collect();
    format!("{prefix}...")
}

impl ContextStore {
    /// Idempotent per `(tenant_id, external_id)`.
    pub async fn create_or_get_user(
        &self,
        tenant_id: &str,
        external_id: &str,
        email: Option<&str>,
    ) -> Result<(i64, String)> {
        let tenant = tenant_id.to_string();
        let external = external_id.to_string();
        let email = email.map(str::to_string);

        let (user_id, credential) = self
            .with_conn(move |conn| create_or_get_user(conn, &tenant, &external, email.as_deref()))
            .await
            .inspect_err(|e| log_failure("create_or_get_user", tenant_id, None, e))?;

        tracing::info!(
            user_id,
            tenant = %tenant_id,
            external_id = %redact(external_id),
            "resolved user for external identity"
        );
        Ok((user_id, credential))
    }

    pub async fn resolve_credential(&self, credential: &str) -> Result<Option<Principal>> {
        let credential = credential.to_string();
        let principal = self
            .with_conn(move |conn| resolve_credential(conn, &credential))
            .await
            .inspect_err(|e| log_failure("resolve_credential", "-", None, e))?;

        if principal.is_none() {
            tracing::debug!("credential did not resolve");
        }
        Ok(principal)
    }

    pub async fn get_user(&self, user_id: i64, tenant_id: &str) -> Result<Option<User>> {
        let tenant = tenant_id.to_string();
        self.with_conn(move |conn| get_user(conn, user_id, &tenant))
            .await
            .inspect_err(|e| log_failure("get_user", tenant_id, None, e))
    }

    pub async fn update_settings(&self, user_id: i64, tenant_id: &str, settings: Value) -> Result<bool> {
        let tenant = tenant_id.to_string();
        self.with_conn(move |conn| update_settings(conn, user_id, &tenant, &settings))
            .await
            .inspect_err(|e| log_failure("update_settings", tenant_id, None, e))
    }
}
