use anyhow::{Context, Result};
use jean_memory::config::JeanConfig;
use jean_memory::identity::Principal;
use jean_memory::router::{QueryRouter, RoutedResult};
use jean_memory::store::ContextStore;
use std::sync::Arc;

pub async fn query(
    config: &JeanConfig,
    store: Arc<ContextStore>,
    principal: &Principal,
    query: &str,
    banks: &[&str],
    as_json: bool,
) -> Result<()> {
    let router = QueryRouter::from_config(config, store);
    let routed = match banks {
        [] => router.route(principal.user_id, &principal.tenant_id, query, None).await,
        [single] => router.route(principal.user_id, &principal.tenant_id, query, Some(*single)).await,
        _ => router.route_banks(principal.user_id, &principal.tenant_id, query, banks).await,
    }
    .context("query failed")?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&routed)?);
        return Ok(());
    }

    match &routed {
        RoutedResult::Category(result) => {
            let origin = if result.synthesized { "synthesized" } else { "raw" };
            println!("Category: {} ({} entries, {origin})", result.category, result.entry_count);
        }
        RoutedResult::Comprehensive { sources, .. } => {
            println!("Sources: {}", sources.join(", "));
        }
        RoutedResult::NoContext { .. } => {}
        RoutedResult::UnhandledCategory { category, .. } => {
            println!("Category: {category} (unhandled)");
        }
    }
    println!("{}", routed.content());
    Ok(())
}
