use anyhow::Result;
use jean_memory::identity::Principal;
use jean_memory::store::ContextStore;

/// Display per-category entry counts in the terminal.
pub async fn stats(store: &ContextStore, principal: &Principal) -> Result<()> {
    let counts = store
        .list_categories(principal.user_id, &principal.tenant_id)
        .await?;

    println!("Context Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total entries:       {}", counts.iter().map(|c| c.entries).sum::<u64>());
    println!();

    if counts.is_empty() {
        println!("No entries stored yet.");
        return Ok(());
    }

    println!("By Category:");
    for count in &counts {
        println!(
            "  {:<16} {:>6}   last updated {}",
            count.category,
            count.entries,
            count.last_updated.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
