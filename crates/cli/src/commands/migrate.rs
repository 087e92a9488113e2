//! Database migration command.
//!
//! ```bash
//! da-cli migrate
//! ```
//!
//! Migrations are embedded from `crates/api/migrations/` and applied in
//! order; already applied ones are skipped.

use dulce_arte_api::db;

use super::CommandError;

/// Run every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
