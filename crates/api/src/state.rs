//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::CatalogStore;
use crate::services::auth::{AuthService, TokenKeys};
use crate::services::uploads::Uploads;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the configuration, the catalog store
/// and the token and upload services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn CatalogStore>,
    keys: TokenKeys,
    uploads: Uploads,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ApiConfig, store: Arc<dyn CatalogStore>) -> Self {
        let keys = TokenKeys::new(&config.jwt_secret, config.token_ttl);
        let uploads = Uploads::new(config.upload_dir.clone(), config.max_upload_bytes);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                keys,
                uploads,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog store.
    #[must_use]
    pub fn store(&self) -> &dyn CatalogStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn keys(&self) -> &TokenKeys {
        &self.inner.keys
    }

    #[must_use]
    pub fn uploads(&self) -> &Uploads {
        &self.inner.uploads
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store(), self.keys())
    }
}
