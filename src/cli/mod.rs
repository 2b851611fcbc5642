pub mod entries;
pub mod query;
pub mod stats;
pub mod user;

use anyhow::{Context, Result};
use jean_memory::config::JeanConfig;
use jean_memory::identity::Principal;
use jean_memory::store::ContextStore;
use serde_json::{json, Value};

/// Open (creating if needed) the database and report its schema version.
pub async fn init(config: &JeanConfig, store: &ContextStore) -> Result<()> {
    let version = store
        .schema_version()
        .await
        .context("failed to read schema version")?;
    println!("Database ready at {}", config.resolved_db_path().display());
    println!("  Schema version: {version}");
    println!("  Default tenant: {}", config.storage.default_tenant);
    Ok(())
}

/// Resolve the credential to a principal. Missing or unknown credentials are errors.
pub async fn authenticate(store: &ContextStore, credential: Option<&str>) -> Result<Principal> {
    let credential = credential
        .filter(|c| !c.trim().is_empty())
        .context("no credential: pass --credential or set JEAN_API_KEY")?;

    store
        .resolve_credential(credential.trim())
        .await
        .context("credential lookup failed")?
        .context("unknown credential")
}

/// Parse CLI input as JSON, wrapping anything else as `{"text": input}`.
pub fn parse_content(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "text": raw }))
}
