//! Initial data: default categories, default settings and the admin user.
//!
//! Safe to run more than once. Categories and settings that already exist
//! are left alone, and the admin is only created while no admin exists.

use dulce_arte_api::db::PgCatalogStore;
use dulce_arte_api::db::seed::{self, AdminSeed};
use dulce_arte_api::services::auth;

use super::CommandError;

/// Admin account to create when the table is empty.
pub struct SeedAdmin<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub password: &'a str,
}

/// Seed the database.
///
/// # Errors
///
/// Returns an error if the admin fields are invalid (checked before
/// connecting) or the database fails.
pub async fn run(admin: &SeedAdmin<'_>) -> Result<(), CommandError> {
    let input = auth::new_admin(admin.username, admin.email, admin.name, admin.password)?;
    let admin = AdminSeed {
        username: input.username,
        email: input.email,
        name: input.name,
        password_hash: input.password_hash,
    };

    let pool = super::connect().await?;
    let store = PgCatalogStore::new(pool);
    let report = seed::seed_all(&store, Some(&admin)).await?;

    tracing::info!("  Categories created: {}", report.categories_created);
    tracing::info!("  Settings created: {}", report.settings_created);
    if report.admin_created {
        tracing::info!("  Admin created: {}", admin.username);
    } else {
        tracing::info!("  Admin skipped (an admin already exists)");
    }
    Ok(())
}
