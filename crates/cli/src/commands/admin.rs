//! Admin user management.
//!
//! ```bash
//! da-cli admin create -u maria -e maria@reposteria.com -n "María" --password '...'
//! ```

use dulce_arte_api::db::{CatalogStore, PgCatalogStore, RepositoryError};
use dulce_arte_api::services::auth::{AuthError, new_admin};
use dulce_arte_core::AdminUserSummary;

use super::CommandError;

/// Create an admin user.
///
/// Input is validated and the password hashed before connecting.
///
/// # Errors
///
/// Returns `AuthError` for invalid input or a taken username/email, and a
/// database error if the store fails.
pub async fn create_user(
    username: &str,
    email: &str,
    name: &str,
    password: &str,
) -> Result<AdminUserSummary, CommandError> {
    let input = new_admin(username, email, name, password)?;

    let pool = super::connect().await?;
    let store = PgCatalogStore::new(pool);

    tracing::info!("Creating admin user: {} ({})", input.username, input.email);
    let user = store.create_admin(&input).await.map_err(|e| match e {
        RepositoryError::Conflict(_) => CommandError::Auth(AuthError::UserAlreadyExists),
        other => CommandError::Repository(other),
    })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );
    Ok(user)
}
