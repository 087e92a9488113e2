//! Persistence for the catalog, admin users and site settings.
//!
//! # Tables
//!
//! - `categories` - Product categories (unique name)
//! - `products` - Catalog items, `category_id` nullable
//! - `admin_users` - Admin accounts (argon2 password hashes)
//! - `site_settings` - Flat key/value storefront settings
//!
//! # Providers
//!
//! Handlers only see the [`CatalogStore`] trait. Two providers implement it:
//!
//! - [`PgCatalogStore`] - `PostgreSQL` via sqlx
//! - [`MemoryCatalogStore`] - in-process store for local runs and tests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p dulce-arte-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;
pub mod seed;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use dulce_arte_core::{
    AdminUserId, AdminUserSummary, Category, CategoryId, DashboardStats, DeletePolicy, Email,
    NewCategory, NewProduct, Product, ProductId, SettingKey,
};

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., duplicate category name).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Foreign key points at a missing row.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning constraint violations into typed variants.
    pub(crate) fn from_sqlx(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return Self::Conflict(conflict.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::InvalidReference("category does not exist".to_owned());
            }
        }
        Self::Database(e)
    }
}

/// Filter for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Only `available` products.
    pub available_only: bool,
    /// Only products of this category.
    pub category_id: Option<CategoryId>,
}

impl ProductFilter {
    /// What the public catalog shows.
    #[must_use]
    pub const fn public(category_id: Option<CategoryId>) -> Self {
        Self {
            available_only: true,
            category_id,
        }
    }
}

/// Outcome of deleting a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRemoval {
    /// Products detached (`SetNull`) or deleted (`Cascade`).
    pub affected_products: u64,
    /// Stored images of products deleted by the cascade.
    pub orphaned_images: Vec<String>,
}

/// A stored setting row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSetting {
    pub key: SettingKey,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Admin row including the password hash. Only the auth service reads it.
#[derive(Clone)]
pub struct AdminCredentials {
    pub user: AdminUserSummary,
    pub password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("user", &self.user)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Fields for a new admin account.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub username: String,
    pub email: Email,
    pub name: String,
    pub password_hash: String,
}

/// Storage interface shared by every persistence provider.
///
/// Implementations must keep these invariants:
/// - category names, admin usernames/emails and setting keys are unique
/// - a product's `category_id` references an existing category or is `NULL`
/// - deleting a category applies the given [`DeletePolicy`] atomically
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// All categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// Fails with `Conflict` when the name is taken.
    async fn create_category(&self, input: &NewCategory) -> Result<Category, RepositoryError>;

    /// Fails with `NotFound` or `Conflict`.
    async fn update_category(
        &self,
        id: CategoryId,
        input: &NewCategory,
    ) -> Result<Category, RepositoryError>;

    /// Fails with `NotFound` when the category does not exist.
    async fn delete_category(
        &self,
        id: CategoryId,
        policy: DeletePolicy,
    ) -> Result<CategoryRemoval, RepositoryError>;

    /// Products newest first, with the category name resolved.
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Fails with `InvalidReference` when the category does not exist.
    async fn create_product(
        &self,
        input: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError>;

    /// Replace every field. `image_url: None` keeps the current image.
    async fn update_product(
        &self,
        id: ProductId,
        input: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError>;

    /// Returns the deleted product so its image can be removed.
    async fn delete_product(&self, id: ProductId) -> Result<Product, RepositoryError>;

    /// Every stored setting with a recognized key.
    async fn list_settings(&self) -> Result<Vec<StoredSetting>, RepositoryError>;

    async fn get_setting(&self, key: SettingKey) -> Result<Option<StoredSetting>, RepositoryError>;

    /// Insert or overwrite. `value` must already be normalized.
    async fn upsert_setting(
        &self,
        key: SettingKey,
        value: &str,
    ) -> Result<StoredSetting, RepositoryError>;

    /// Insert only when the key is absent. Returns whether a row was written.
    async fn insert_setting_if_missing(
        &self,
        key: SettingKey,
        value: &str,
    ) -> Result<bool, RepositoryError>;

    /// Look up an admin by username or email.
    async fn find_admin_by_login(
        &self,
        login: &str,
    ) -> Result<Option<AdminCredentials>, RepositoryError>;

    async fn get_admin(&self, id: AdminUserId)
    -> Result<Option<AdminUserSummary>, RepositoryError>;

    /// Fails with `Conflict` when the username or email is taken.
    async fn create_admin(&self, input: &NewAdminUser)
    -> Result<AdminUserSummary, RepositoryError>;

    async fn count_admins(&self) -> Result<i64, RepositoryError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the embedded migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
