//! In-process provider.
//!
//! Mirrors the `PostgreSQL` schema rules (unique names, nullable category
//! reference, delete policies) behind a single `RwLock`, so every operation
//! is atomic with respect to the others.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use dulce_arte_core::{
    AdminUserId, AdminUserSummary, Category, CategoryId, DashboardStats, DeletePolicy,
    NewCategory, NewProduct, Price, Product, ProductId, ProductStatus, SettingKey,
};

use super::{
    AdminCredentials, CatalogStore, CategoryRemoval, NewAdminUser, ProductFilter,
    RepositoryError, StoredSetting,
};

#[derive(Debug, Clone)]
struct ProductRecord {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Price,
    category_id: Option<CategoryId>,
    status: ProductStatus,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, ProductRecord>,
    admins: BTreeMap<AdminUserId, AdminCredentials>,
    settings: BTreeMap<SettingKey, StoredSetting>,
    next_category: i32,
    next_product: i32,
    next_admin: i32,
}

impl Tables {
    fn name_taken(&self, name: &str, except: Option<CategoryId>) -> bool {
        self.categories
            .values()
            .any(|c| c.name == name && Some(c.id) != except)
    }

    fn resolve(&self, record: &ProductRecord) -> Product {
        let category_name = record
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map(|c| c.name.clone());

        Product {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            price: record.price,
            category_id: record.category_id,
            category_name,
            status: record.status,
            image_url: record.image_url.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    fn check_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::InvalidReference(
                "category does not exist".to_owned(),
            ))
        }
    }
}

/// [`CatalogStore`] kept in memory. Data is lost on restart.
#[derive(Default)]
pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn create_category(&self, input: &NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&input.name, None) {
            return Err(RepositoryError::Conflict(
                "category name already exists".to_owned(),
            ));
        }

        tables.next_category += 1;
        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(tables.next_category),
            name: input.name.clone(),
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        input: &NewCategory,
    ) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.name_taken(&input.name, Some(id)) {
            return Err(RepositoryError::Conflict(
                "category name already exists".to_owned(),
            ));
        }

        let category = tables
            .categories
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        category.name.clone_from(&input.name);
        category.description.clone_from(&input.description);
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn delete_category(
        &self,
        id: CategoryId,
        policy: DeletePolicy,
    ) -> Result<CategoryRemoval, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        let mut removal = CategoryRemoval {
            affected_products: 0,
            orphaned_images: Vec::new(),
        };

        match policy {
            DeletePolicy::SetNull => {
                for product in tables.products.values_mut() {
                    if product.category_id == Some(id) {
                        product.category_id = None;
                        product.updated_at = now;
                        removal.affected_products += 1;
                    }
                }
            }
            DeletePolicy::Cascade => {
                tables.products.retain(|_, product| {
                    if product.category_id != Some(id) {
                        return true;
                    }
                    removal.affected_products += 1;
                    if let Some(url) = product.image_url.take() {
                        removal.orphaned_images.push(url);
                    }
                    false
                });
            }
        }

        Ok(removal)
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| !filter.available_only || p.status == ProductStatus::Available)
            .filter(|p| filter.category_id.is_none_or(|id| p.category_id == Some(id)))
            .map(|p| tables.resolve(p))
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&id).map(|p| tables.resolve(p)))
    }

    async fn create_product(
        &self,
        input: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.check_category(input.category_id)?;

        tables.next_product += 1;
        let now = Utc::now();
        let record = ProductRecord {
            id: ProductId::new(tables.next_product),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            category_id: Some(input.category_id),
            status: input.status,
            image_url: image_url.map(str::to_owned),
            created_at: now,
            updated_at: now,
        };
        let product = tables.resolve(&record);
        tables.products.insert(record.id, record);
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        tables.check_category(input.category_id)?;

        let record = tables
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        record.name.clone_from(&input.name);
        record.description.clone_from(&input.description);
        record.price = input.price;
        record.category_id = Some(input.category_id);
        record.status = input.status;
        if let Some(url) = image_url {
            record.image_url = Some(url.to_owned());
        }
        record.updated_at = Utc::now();

        let record = record.clone();
        Ok(tables.resolve(&record))
    }

    async fn delete_product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        let record = tables.products.remove(&id).ok_or(RepositoryError::NotFound)?;
        Ok(tables.resolve(&record))
    }

    async fn list_settings(&self) -> Result<Vec<StoredSetting>, RepositoryError> {
        Ok(self.tables.read().await.settings.values().cloned().collect())
    }

    async fn get_setting(&self, key: SettingKey) -> Result<Option<StoredSetting>, RepositoryError> {
        Ok(self.tables.read().await.settings.get(&key).cloned())
    }

    async fn upsert_setting(
        &self,
        key: SettingKey,
        value: &str,
    ) -> Result<StoredSetting, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let entry = tables.settings.entry(key).or_insert_with(|| StoredSetting {
            key,
            value: String::new(),
            description: Some(key.description().to_owned()),
            updated_at: now,
        });
        value.clone_into(&mut entry.value);
        entry.updated_at = now;
        Ok(entry.clone())
    }

    async fn insert_setting_if_missing(
        &self,
        key: SettingKey,
        value: &str,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.settings.contains_key(&key) {
            return Ok(false);
        }
        tables.settings.insert(
            key,
            StoredSetting {
                key,
                value: value.to_owned(),
                description: Some(key.description().to_owned()),
                updated_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn find_admin_by_login(
        &self,
        login: &str,
    ) -> Result<Option<AdminCredentials>, RepositoryError> {
        let login = login.trim();
        let lowered = login.to_lowercase();
        let tables = self.tables.read().await;

        let by_username = tables.admins.values().find(|a| a.user.username == login);
        let found = by_username.or_else(|| {
            tables
                .admins
                .values()
                .find(|a| a.user.email.as_str() == lowered)
        });
        Ok(found.cloned())
    }

    async fn get_admin(
        &self,
        id: AdminUserId,
    ) -> Result<Option<AdminUserSummary>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .await
            .admins
            .get(&id)
            .map(|a| a.user.clone()))
    }

    async fn create_admin(
        &self,
        input: &NewAdminUser,
    ) -> Result<AdminUserSummary, RepositoryError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .admins
            .values()
            .any(|a| a.user.username == input.username || a.user.email == input.email);
        if taken {
            return Err(RepositoryError::Conflict(
                "username or email already exists".to_owned(),
            ));
        }

        tables.next_admin += 1;
        let user = AdminUserSummary {
            id: AdminUserId::new(tables.next_admin),
            username: input.username.clone(),
            email: input.email.clone(),
            name: input.name.clone(),
        };
        tables.admins.insert(
            user.id,
            AdminCredentials {
                user: user.clone(),
                password_hash: input.password_hash.clone(),
            },
        );
        Ok(user)
    }

    async fn count_admins(&self) -> Result<i64, RepositoryError> {
        Ok(i64::try_from(self.tables.read().await.admins.len()).unwrap_or(i64::MAX))
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        let tables = self.tables.read().await;
        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);

        Ok(DashboardStats {
            total_products: count(tables.products.len()),
            total_categories: count(tables.categories.len()),
            available_products: count(
                tables
                    .products
                    .values()
                    .filter(|p| p.status == ProductStatus::Available)
                    .count(),
            ),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dulce_arte_core::Email;

    use super::*;

    fn category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_owned(),
            description: None,
        }
    }

    fn product(name: &str, category_id: CategoryId, status: ProductStatus) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: None,
            price: Price::parse("12000").unwrap(),
            category_id,
            status,
        }
    }

    #[tokio::test]
    async fn test_category_names_are_unique() {
        let store = MemoryCatalogStore::new();
        store.create_category(&category("Tortas")).await.unwrap();
        let err = store.create_category(&category("Tortas")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_category_rename_conflict() {
        let store = MemoryCatalogStore::new();
        store.create_category(&category("Tortas")).await.unwrap();
        let galletas = store.create_category(&category("Galletas")).await.unwrap();

        let err = store
            .update_category(galletas.id, &category("Tortas"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        // Keeping its own name is fine.
        let same = store
            .update_category(galletas.id, &category("Galletas"))
            .await
            .unwrap();
        assert_eq!(same.name, "Galletas");
    }

    #[tokio::test]
    async fn test_categories_sorted_by_name() {
        let store = MemoryCatalogStore::new();
        for name in ["Tortas", "Cupcakes", "Galletas"] {
            store.create_category(&category(name)).await.unwrap();
        }
        let names: Vec<String> = store
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Cupcakes", "Galletas", "Tortas"]);
    }

    #[tokio::test]
    async fn test_product_requires_existing_category() {
        let store = MemoryCatalogStore::new();
        let err = store
            .create_product(
                &product("Brownie", CategoryId::new(99), ProductStatus::Available),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_public_filter_and_category_name() {
        let store = MemoryCatalogStore::new();
        let tortas = store.create_category(&category("Tortas")).await.unwrap();
        let galletas = store.create_category(&category("Galletas")).await.unwrap();
        store
            .create_product(&product("Selva negra", tortas.id, ProductStatus::Available), None)
            .await
            .unwrap();
        store
            .create_product(&product("Tres leches", tortas.id, ProductStatus::SoldOut), None)
            .await
            .unwrap();
        store
            .create_product(&product("Avena", galletas.id, ProductStatus::Available), None)
            .await
            .unwrap();

        let all = store.list_products(ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let public = store.list_products(ProductFilter::public(None)).await.unwrap();
        assert_eq!(public.len(), 2);

        let public_tortas = store
            .list_products(ProductFilter::public(Some(tortas.id)))
            .await
            .unwrap();
        assert_eq!(public_tortas.len(), 1);
        assert_eq!(public_tortas[0].category_name.as_deref(), Some("Tortas"));
    }

    #[tokio::test]
    async fn test_delete_category_set_null_keeps_products() {
        let store = MemoryCatalogStore::new();
        let tortas = store.create_category(&category("Tortas")).await.unwrap();
        let p = store
            .create_product(&product("Selva negra", tortas.id, ProductStatus::Available), None)
            .await
            .unwrap();

        let removal = store
            .delete_category(tortas.id, DeletePolicy::SetNull)
            .await
            .unwrap();
        assert_eq!(removal.affected_products, 1);

        let kept = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(kept.category_id, None);
        assert_eq!(kept.category_name, None);
    }

    #[tokio::test]
    async fn test_delete_category_cascade_reports_images() {
        let store = MemoryCatalogStore::new();
        let tortas = store.create_category(&category("Tortas")).await.unwrap();
        let p = store
            .create_product(
                &product("Selva negra", tortas.id, ProductStatus::Available),
                Some("/uploads/product-a.jpg"),
            )
            .await
            .unwrap();

        let removal = store
            .delete_category(tortas.id, DeletePolicy::Cascade)
            .await
            .unwrap();
        assert_eq!(removal.affected_products, 1);
        assert_eq!(removal.orphaned_images, ["/uploads/product-a.jpg"]);
        assert!(store.get_product(p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_category() {
        let store = MemoryCatalogStore::new();
        let err = store
            .delete_category(CategoryId::new(5), DeletePolicy::SetNull)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_update_product_keeps_image_when_none() {
        let store = MemoryCatalogStore::new();
        let tortas = store.create_category(&category("Tortas")).await.unwrap();
        let p = store
            .create_product(
                &product("Selva negra", tortas.id, ProductStatus::Available),
                Some("/uploads/product-a.jpg"),
            )
            .await
            .unwrap();

        let updated = store
            .update_product(p.id, &product("Selva negra XL", tortas.id, ProductStatus::SoldOut), None)
            .await
            .unwrap();
        assert_eq!(updated.name, "Selva negra XL");
        assert_eq!(updated.image_url.as_deref(), Some("/uploads/product-a.jpg"));

        let replaced = store
            .update_product(
                p.id,
                &product("Selva negra XL", tortas.id, ProductStatus::SoldOut),
                Some("/uploads/product-b.png"),
            )
            .await
            .unwrap();
        assert_eq!(replaced.image_url.as_deref(), Some("/uploads/product-b.png"));
    }

    #[tokio::test]
    async fn test_settings_upsert_and_seed() {
        let store = MemoryCatalogStore::new();
        assert!(store
            .insert_setting_if_missing(SettingKey::HeroVisible, "true")
            .await
            .unwrap());
        assert!(!store
            .insert_setting_if_missing(SettingKey::HeroVisible, "false")
            .await
            .unwrap());

        let stored = store
            .upsert_setting(SettingKey::HeroVisible, "false")
            .await
            .unwrap();
        assert_eq!(stored.value, "false");
        assert_eq!(store.list_settings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_admin_lookup_by_username_or_email() {
        let store = MemoryCatalogStore::new();
        let admin = store
            .create_admin(&NewAdminUser {
                username: "admin".to_owned(),
                email: Email::parse("admin@reposteria.com").unwrap(),
                name: "Administrador".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap();

        let by_name = store.find_admin_by_login("admin").await.unwrap().unwrap();
        assert_eq!(by_name.user.id, admin.id);
        let by_email = store
            .find_admin_by_login("ADMIN@reposteria.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.user.id, admin.id);
        assert!(store.find_admin_by_login("nobody").await.unwrap().is_none());

        let dup = store
            .create_admin(&NewAdminUser {
                username: "admin".to_owned(),
                email: Email::parse("other@reposteria.com").unwrap(),
                name: "Otro".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(dup, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let store = MemoryCatalogStore::new();
        let tortas = store.create_category(&category("Tortas")).await.unwrap();
        store
            .create_product(&product("A", tortas.id, ProductStatus::Available), None)
            .await
            .unwrap();
        store
            .create_product(&product("B", tortas.id, ProductStatus::SoldOut), None)
            .await
            .unwrap();

        let stats = store.dashboard_stats().await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_products: 2,
                total_categories: 1,
                available_products: 1,
            }
        );
    }
}
