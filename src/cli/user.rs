use anyhow::{Context, Result};
use jean_memory::identity::Principal;
use jean_memory::store::ContextStore;

/// Issue (or re-print) the credential for an external identity.
pub async fn issue(
    store: &ContextStore,
    tenant_id: &str,
    external_id: &str,
    email: Option<&str>,
) -> Result<()> {
    let (user_id, credential) = store
        .create_or_get_user(tenant_id, external_id, email)
        .await
        .context("failed to create user")?;

    println!("User {user_id} in tenant '{tenant_id}'");
    println!("  Credential: {credential}");
    println!();
    println!("Export it for later commands:");
    println!("  export JEAN_API_KEY={credential}");
    Ok(())
}

pub async fn whoami(store: &ContextStore, principal: &Principal) -> Result<()> {
    let user = store
        .get_user(principal.user_id, &principal.tenant_id)
        .await?
        .context("credential resolved but user record is missing")?;

    println!("User:        {}", user.user_id);
    println!("Tenant:      {}", user.tenant_id);
    println!("External id: {}", user.external_id);
    if let Some(email) = &user.email {
        println!("Email:       {email}");
    }
    println!("Created:     {}", user.created_at);
    if let Some(settings) = &user.settings {
        println!("Settings:    {settings}");
    }
    Ok(())
}
