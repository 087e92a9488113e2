//! `PostgreSQL` provider.
//!
//! Queries are checked at runtime and decoded into private row types, which
//! are then converted into the core domain types.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use dulce_arte_core::{
    AdminUserId, AdminUserSummary, Category, CategoryId, DashboardStats, DeletePolicy, Email,
    NewCategory, NewProduct, Price, Product, ProductId, ProductStatus, SettingKey,
};

use super::{
    AdminCredentials, CatalogStore, CategoryRemoval, NewAdminUser, ProductFilter,
    RepositoryError, StoredSetting,
};

const PRODUCT_COLUMNS: &str = r"
    p.id, p.name, p.description, p.price, p.category_id, c.name AS category_name,
    p.status, p.image_url, p.created_at, p.updated_at
";

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";

const SETTING_COLUMNS: &str = "setting_key, setting_value, description, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    category_id: Option<i32>,
    category_name: Option<String>,
    status: ProductStatus,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price,
            category_id: row.category_id.map(CategoryId::new),
            category_name: row.category_name,
            status: row.status,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettingRow {
    setting_key: String,
    setting_value: String,
    description: Option<String>,
    updated_at: DateTime<Utc>,
}

impl SettingRow {
    /// `None` for keys this build does not know about.
    fn into_stored(self) -> Option<StoredSetting> {
        let key = self.setting_key.parse::<SettingKey>().ok()?;
        Some(StoredSetting {
            key,
            value: self.setting_value,
            description: self.description,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdminUserRow {
    id: i32,
    username: String,
    email: String,
    name: String,
    password_hash: String,
}

impl TryFrom<AdminUserRow> for AdminCredentials {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            user: AdminUserSummary {
                id: AdminUserId::new(row.id),
                username: row.username,
                email,
                name: row.name,
            },
            password_hash: row.password_hash,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total_products: i64,
    total_categories: i64,
    available_products: i64,
}

// =============================================================================
// Store
// =============================================================================

/// [`CatalogStore`] backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_product(&self, sql: &str, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    async fn create_category(&self, input: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "category name already exists"))?;

        Ok(row.into())
    }

    async fn update_category(
        &self,
        id: CategoryId,
        input: &NewCategory,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            UPDATE categories
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "category name already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_category(
        &self,
        id: CategoryId,
        policy: DeletePolicy,
    ) -> Result<CategoryRemoval, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i32>("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let removal = match policy {
            DeletePolicy::SetNull => {
                let result = sqlx::query(
                    "UPDATE products SET category_id = NULL, updated_at = NOW() WHERE category_id = $1",
                )
                .bind(id)
                .execute(&mut *tx)
                .await?;
                CategoryRemoval {
                    affected_products: result.rows_affected(),
                    orphaned_images: Vec::new(),
                }
            }
            DeletePolicy::Cascade => {
                let images = sqlx::query_scalar::<_, Option<String>>(
                    "DELETE FROM products WHERE category_id = $1 RETURNING image_url",
                )
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
                CategoryRemoval {
                    affected_products: images.len() as u64,
                    orphaned_images: images.into_iter().flatten().collect(),
                }
            }
        };

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removal)
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE ($1 = FALSE OR p.status = 'available')
              AND ($2::INTEGER IS NULL OR p.category_id = $2)
            ORDER BY p.created_at DESC, p.id DESC
            "
        ))
        .bind(filter.available_only)
        .bind(filter.category_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.fetch_product(
            &format!(
                r"
                SELECT {PRODUCT_COLUMNS}
                FROM products p
                LEFT JOIN categories c ON c.id = p.category_id
                WHERE p.id = $1
                "
            ),
            id,
        )
        .await
    }

    async fn create_product(
        &self,
        input: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            WITH p AS (
                INSERT INTO products (name, description, price, category_id, status, image_url)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {PRODUCT_COLUMNS}
            FROM p
            LEFT JOIN categories c ON c.id = p.category_id
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.status)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "product already exists"))?;

        row.try_into()
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            WITH p AS (
                UPDATE products
                SET name = $2, description = $3, price = $4, category_id = $5, status = $6,
                    image_url = COALESCE($7, image_url), updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {PRODUCT_COLUMNS}
            FROM p
            LEFT JOIN categories c ON c.id = p.category_id
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.status)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "product already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn delete_product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.fetch_product(
            &format!(
                r"
                WITH p AS (DELETE FROM products WHERE id = $1 RETURNING *)
                SELECT {PRODUCT_COLUMNS}
                FROM p
                LEFT JOIN categories c ON c.id = p.category_id
                "
            ),
            id,
        )
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn list_settings(&self) -> Result<Vec<StoredSetting>, RepositoryError> {
        let rows = sqlx::query_as::<_, SettingRow>(&format!(
            "SELECT {SETTING_COLUMNS} FROM site_settings ORDER BY setting_key"
        ))
        .fetch_all(&self.pool)
        .await?;

        // A canonical key wins over its legacy alias.
        let mut settings: BTreeMap<SettingKey, (bool, StoredSetting)> = BTreeMap::new();
        for row in rows {
            let raw_key = row.setting_key.clone();
            let Some(stored) = row.into_stored() else {
                tracing::warn!(key = %raw_key, "Ignoring unknown site setting");
                continue;
            };
            let canonical = stored.key.as_str() == raw_key;
            match settings.get(&stored.key) {
                Some((true, _)) => {}
                _ => {
                    settings.insert(stored.key, (canonical, stored));
                }
            }
        }

        Ok(settings.into_values().map(|(_, s)| s).collect())
    }

    async fn get_setting(&self, key: SettingKey) -> Result<Option<StoredSetting>, RepositoryError> {
        let row = sqlx::query_as::<_, SettingRow>(&format!(
            r"
            SELECT {SETTING_COLUMNS}
            FROM site_settings
            WHERE setting_key = $1 OR setting_key = $2
            ORDER BY (setting_key = $1) DESC
            LIMIT 1
            "
        ))
        .bind(key.as_str())
        .bind(key.legacy_alias().unwrap_or(key.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(SettingRow::into_stored))
    }

    async fn upsert_setting(
        &self,
        key: SettingKey,
        value: &str,
    ) -> Result<StoredSetting, RepositoryError> {
        let row = sqlx::query_as::<_, SettingRow>(&format!(
            r"
            INSERT INTO site_settings (setting_key, setting_value, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (setting_key)
            DO UPDATE SET setting_value = EXCLUDED.setting_value, updated_at = NOW()
            RETURNING {SETTING_COLUMNS}
            "
        ))
        .bind(key.as_str())
        .bind(value)
        .bind(key.description())
        .fetch_one(&self.pool)
        .await?;

        row.into_stored().ok_or_else(|| {
            RepositoryError::DataCorruption(format!("setting {key} written under an unknown key"))
        })
    }

    async fn insert_setting_if_missing(
        &self,
        key: SettingKey,
        value: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO site_settings (setting_key, setting_value, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (setting_key) DO NOTHING
            ",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(key.description())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_admin_by_login(
        &self,
        login: &str,
    ) -> Result<Option<AdminCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, username, email, name, password_hash
            FROM admin_users
            WHERE username = $1 OR email = LOWER($1)
            ORDER BY (username = $1) DESC
            LIMIT 1
            ",
        )
        .bind(login.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdminCredentials::try_from).transpose()
    }

    async fn get_admin(
        &self,
        id: AdminUserId,
    ) -> Result<Option<AdminUserSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            "SELECT id, username, email, name, password_hash FROM admin_users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(AdminCredentials::try_from)
            .transpose()?
            .map(|creds| creds.user))
    }

    async fn create_admin(
        &self,
        input: &NewAdminUser,
    ) -> Result<AdminUserSummary, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            INSERT INTO admin_users (username, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, name, password_hash
            ",
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.name)
        .bind(&input.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "username or email already exists"))?;

        AdminCredentials::try_from(row).map(|creds| creds.user)
    }

    async fn count_admins(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(*) FROM categories) AS total_categories,
                (SELECT COUNT(*) FROM products WHERE status = 'available') AS available_products
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_products: row.total_products,
            total_categories: row.total_categories,
            available_products: row.available_products,
        })
    }
}
