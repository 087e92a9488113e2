//! Dulce Arte API - REST backend for the bakery storefront and admin panel.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out, multipart for product images
//! - [`db::CatalogStore`] trait with `PostgreSQL` and in-memory providers
//! - HS256 bearer tokens for admins, argon2 password hashes
//! - Product images on the local filesystem, served under `/uploads`
//!
//! The binary in `main.rs` only wires configuration, logging and the listener;
//! everything else lives here so integration tests can spawn the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Request, Response, StatusCode},
    routing::get,
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use dulce_arte_core::Email;

use crate::config::{ApiConfig, StoreBackend};
use crate::db::seed::{self, AdminSeed};
use crate::db::{CatalogStore, MemoryCatalogStore, PgCatalogStore, RepositoryError};
use crate::services::auth::{AuthError, hash_password};
use crate::services::uploads::{PUBLIC_PREFIX, UploadError};

pub use crate::state::AppState;

/// Username of the admin seeded into a memory store.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
/// Email of the admin seeded into a memory store.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@reposteria.com";
/// Display name of the admin seeded into a memory store.
pub const DEFAULT_ADMIN_NAME: &str = "Administrador";

/// Failure while preparing the server.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("seeding failed: {0}")]
    Seed(#[from] RepositoryError),

    #[error("invalid seed admin: {0}")]
    SeedAdmin(#[from] AuthError),

    #[error("upload directory unavailable: {0}")]
    Uploads(#[from] UploadError),
}

/// Open the configured store.
///
/// A memory store is seeded with the default categories and settings, plus
/// the admin when `API_SEED_ADMIN_PASSWORD` is set. `PostgreSQL` is expected
/// to be migrated and seeded through the CLI.
///
/// # Errors
///
/// Returns `StartupError` if the database is unreachable or seeding fails.
pub async fn build_store(config: &ApiConfig) -> Result<Arc<dyn CatalogStore>, StartupError> {
    match &config.store {
        StoreBackend::Postgres { database_url } => {
            let pool = db::create_pool(database_url).await?;
            tracing::info!("Database pool created");
            Ok(Arc::new(PgCatalogStore::new(pool)))
        }
        StoreBackend::Memory => {
            let store = MemoryCatalogStore::new();
            let admin = match &config.seed_admin_password {
                Some(password) => Some(AdminSeed {
                    username: DEFAULT_ADMIN_USERNAME.to_owned(),
                    email: Email::parse(DEFAULT_ADMIN_EMAIL).map_err(AuthError::from)?,
                    name: DEFAULT_ADMIN_NAME.to_owned(),
                    password_hash: hash_password(password.expose_secret())?,
                }),
                None => None,
            };
            seed::seed_all(&store, admin.as_ref()).await?;
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(store))
        }
    }
}

/// Build the application state and make sure the upload directory exists.
///
/// # Errors
///
/// See [`build_store`].
pub async fn build_state(config: ApiConfig) -> Result<AppState, StartupError> {
    let store = build_store(&config).await?;
    let state = AppState::new(config, store);
    state.uploads().ensure_dir().await?;
    Ok(state)
}

/// Build the full router: health checks, `/api`, `/uploads` and the
/// middleware stack.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// login rate limiter can key on the peer address.
pub fn app(state: AppState) -> Router {
    let api = routes::routes(
        state.config().login_burst,
        state.config().max_upload_bytes,
    );
    let uploads_dir = state.uploads().dir().to_path_buf();
    let cors = cors_layer(&state.config().cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(uploads_dir))
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        admin_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the storefront origin(s). No configured origins means any.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
