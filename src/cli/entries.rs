use anyhow::{Context, Result};
use jean_memory::identity::Principal;
use jean_memory::memory::types::ContextEntry;
use jean_memory::store::ContextStore;

use super::parse_content;

pub async fn store(
    store: &ContextStore,
    principal: &Principal,
    category: &str,
    content: &str,
    source_key: Option<&str>,
    metadata: Option<&str>,
) -> Result<()> {
    let metadata = metadata
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--metadata must be JSON")?;

    let stored = store
        .upsert(
            principal.user_id,
            &principal.tenant_id,
            category,
            parse_content(content),
            source_key,
            metadata,
        )
        .await
        .context("entry was not stored")?;

    let verb = if stored.created { "Stored" } else { "Updated" };
    println!("{verb} entry {} ({category}/{})", stored.id, stored.source_key);
    Ok(())
}

pub async fn get(
    store: &ContextStore,
    principal: &Principal,
    category: &str,
    source_key: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let entries = store
        .get(principal.user_id, &principal.tenant_id, category, source_key, limit)
        .await?;
    print_entries(&entries)
}

pub async fn get_by_id(store: &ContextStore, principal: &Principal, id: i64) -> Result<()> {
    match store.get_by_id(principal.user_id, &principal.tenant_id, id).await? {
        Some(entry) => print_entries(&[entry]),
        None => {
            println!("No entry {id}.");
            Ok(())
        }
    }
}

pub async fn search(
    store: &ContextStore,
    principal: &Principal,
    category: &str,
    text: &str,
    limit: usize,
) -> Result<()> {
    let entries = store
        .search(principal.user_id, &principal.tenant_id, category, text, limit)
        .await?;
    print_entries(&entries)
}

pub async fn forget_id(store: &ContextStore, principal: &Principal, id: i64) -> Result<()> {
    if store.delete_by_id(principal.user_id, &principal.tenant_id, id).await? {
        println!("Deleted entry {id}.");
    } else {
        println!("No entry {id}.");
    }
    Ok(())
}

pub async fn forget_category(store: &ContextStore, principal: &Principal, category: &str) -> Result<()> {
    let removed = store
        .delete_category(principal.user_id, &principal.tenant_id, category)
        .await?;
    println!("Deleted {removed} entries from '{category}'.");
    Ok(())
}

pub async fn forget_all(store: &ContextStore, principal: &Principal) -> Result<()> {
    let removed = store.delete_user(principal.user_id, &principal.tenant_id).await?;
    println!("Deleted {removed} entries.");
    Ok(())
}

fn print_entries(entries: &[ContextEntry]) -> Result<()> {
    if entries.is_empty() {
        println!("No entries.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "[{}] {}/{}  (updated {})",
            entry.id, entry.category, entry.source_key, entry.updated_at
        );
        println!("{}", serde_json::to_string_pretty(&entry.content)?);
        println!();
    }
    Ok(())
}
