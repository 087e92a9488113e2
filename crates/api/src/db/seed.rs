//! Initial data: default categories, settings and the first admin.
//!
//! Every step is idempotent, so seeding an already-populated store only fills
//! in what is missing.

use dulce_arte_core::{Email, NewCategory, SettingKey};

use super::{CatalogStore, NewAdminUser, RepositoryError};

/// Categories created on first run, with their descriptions.
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Tortas", "Tortas para toda ocasión"),
    ("Cupcakes", "Cupcakes decorados artesanalmente"),
    ("Galletas", "Galletas caseras y decoradas"),
    ("Postres", "Postres individuales y para compartir"),
];

/// Settings written on first run.
pub const DEFAULT_SETTINGS: [(SettingKey, &str); 5] = [
    (SettingKey::HeroVisible, "true"),
    (SettingKey::SiteTitle, "Repostería Artesanal"),
    (SettingKey::HeroTitle, "Dulce Arte"),
    (SettingKey::HeroSubtitle, "Repostería artesanal hecha con amor"),
    (SettingKey::ContactEmail, "info@reposteria.com"),
];

/// The single admin account created by initialization.
#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: Email,
    pub name: String,
    /// Already hashed with argon2.
    pub password_hash: String,
}

/// What a seed run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories_created: usize,
    pub settings_created: usize,
    pub admin_created: bool,
}

/// Create the default categories whose names are not taken yet.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn seed_categories(store: &dyn CatalogStore) -> Result<usize, RepositoryError> {
    let existing: Vec<String> = store
        .list_categories()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    let mut created = 0;
    for (name, description) in DEFAULT_CATEGORIES {
        if existing.iter().any(|n| n == name) {
            continue;
        }
        let input = NewCategory {
            name: name.to_owned(),
            description: Some(description.to_owned()),
        };
        match store.create_category(&input).await {
            Ok(_) => created += 1,
            // Created concurrently by another seeder.
            Err(RepositoryError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(created)
}

/// Write default settings that are not stored yet.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn seed_settings(store: &dyn CatalogStore) -> Result<usize, RepositoryError> {
    let mut created = 0;
    for (key, value) in DEFAULT_SETTINGS {
        if store.get_setting(key).await?.is_some() {
            continue;
        }
        if store.insert_setting_if_missing(key, value).await? {
            created += 1;
        }
    }
    Ok(created)
}

/// Create the admin only when no admin exists at all.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn seed_admin(store: &dyn CatalogStore, admin: &AdminSeed) -> Result<bool, RepositoryError> {
    if store.count_admins().await? > 0 {
        return Ok(false);
    }
    store
        .create_admin(&NewAdminUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            name: admin.name.clone(),
            password_hash: admin.password_hash.clone(),
        })
        .await?;
    Ok(true)
}

/// Run every seed step.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn seed_all(
    store: &dyn CatalogStore,
    admin: Option<&AdminSeed>,
) -> Result<SeedReport, RepositoryError> {
    let categories_created = seed_categories(store).await?;
    let settings_created = seed_settings(store).await?;
    let admin_created = match admin {
        Some(admin) => seed_admin(store, admin).await?,
        None => false,
    };

    tracing::info!(
        categories_created,
        settings_created,
        admin_created,
        "Seed complete"
    );

    Ok(SeedReport {
        categories_created,
        settings_created,
        admin_created,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryCatalogStore;

    fn admin() -> AdminSeed {
        AdminSeed {
            username: "admin".to_owned(),
            email: Email::parse("admin@reposteria.com").unwrap(),
            name: "Administrador".to_owned(),
            password_hash: "not-a-real-hash".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryCatalogStore::new();

        let first = seed_all(&store, Some(&admin())).await.unwrap();
        assert_eq!(first.categories_created, 4);
        assert_eq!(first.settings_created, DEFAULT_SETTINGS.len());
        assert!(first.admin_created);

        let second = seed_all(&store, Some(&admin())).await.unwrap();
        assert_eq!(second, SeedReport::default());
        assert_eq!(store.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_setting_values() {
        let store = MemoryCatalogStore::new();
        store
            .upsert_setting(SettingKey::HeroVisible, "false")
            .await
            .unwrap();

        seed_settings(&store).await.unwrap();

        let hero = store
            .get_setting(SettingKey::HeroVisible)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hero.value, "false");
    }
}
