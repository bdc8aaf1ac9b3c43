//! Account permission management.
//!
//! Bootstraps the first administrator: signup only ever grants `USER`, and
//! the HTTP permission endpoint requires `ADMIN` or `PERMISSIONUPDATE`.

use fitshop_api::db::{PgStore, UserStore};
use fitshop_core::{Email, Permission, PermissionSet};

use super::{CommandError, database_url};

async fn connect() -> Result<PgStore, CommandError> {
    let database_url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(PgStore::new(fitshop_api::db::create_pool(&database_url).await?))
}

/// Add `permissions` to the account with `email`.
pub async fn grant(email: &str, permissions: &[Permission]) -> Result<(), CommandError> {
    update(email, |current| {
        current.iter().chain(permissions.iter().copied()).collect()
    })
    .await
}

/// Remove `permissions` from the account with `email`.
pub async fn revoke(email: &str, permissions: &[Permission]) -> Result<(), CommandError> {
    update(email, |current| {
        current.iter().filter(|p| !permissions.contains(p)).collect()
    })
    .await
}

async fn update(
    email: &str,
    change: impl FnOnce(&PermissionSet) -> PermissionSet,
) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let store = connect().await?;

    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| CommandError::UserNotFound(email.to_string()))?;

    let permissions = change(&user.permissions);
    if permissions.is_empty() {
        return Err(CommandError::EmptyPermissions(email.to_string()));
    }

    let user = store.update_permissions(user.id, &permissions).await?;
    tracing::info!(
        "Updated {} (ID {}): {}",
        user.email,
        user.id,
        user.permissions.to_strings().join(", ")
    );
    Ok(())
}

/// Print every account with its permissions.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), CommandError> {
    let store = connect().await?;

    for user in store.list_users().await? {
        println!(
            "{:>6}  {:<40}  {}",
            user.id,
            user.email,
            user.permissions.to_strings().join(",")
        );
    }
    Ok(())
}
