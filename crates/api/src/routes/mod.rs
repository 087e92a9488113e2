//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /api/auth/login               - Exchange credentials for a bearer token (rate limited)
//! GET  /api/auth/me                  - Current admin
//!
//! # Public catalog (no auth)
//! GET  /api/public/categories        - All categories by name
//! GET  /api/public/products          - Available products, ?category_id= narrows
//! GET  /api/public/settings          - Flat settings map
//!
//! # Admin (bearer token)
//! GET    /api/categories             - List
//! POST   /api/categories             - Create (JSON)
//! GET    /api/categories/{id}        - Show
//! PUT    /api/categories/{id}        - Update (JSON)
//! DELETE /api/categories/{id}        - Delete, applying the configured policy
//! GET    /api/products               - List, every status
//! POST   /api/products               - Create (multipart)
//! GET    /api/products/{id}          - Show
//! PUT    /api/products/{id}          - Update (multipart)
//! DELETE /api/products/{id}          - Delete with its image
//! GET    /api/settings               - Flat settings map
//! GET    /api/settings/{key}         - One setting with description
//! PUT    /api/settings/{key}         - Update one setting
//! GET    /api/dashboard/stats        - Counts for the panel home
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod products;
pub mod public;
pub mod settings;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Multipart framing allowance on top of the image size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the auth routes router.
pub fn auth_routes(login_burst: u32) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(auth::login).layer(login_rate_limiter(login_burst)),
        )
        .route("/me", get(auth::me))
}

/// Create the public catalog routes router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(public::categories))
        .route("/products", get(public::products))
        .route("/settings", get(public::settings))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::destroy),
        )
}

/// Create the product routes router.
///
/// The body limit is raised so oversized images reach the handler and get a
/// proper `413` with a JSON body.
pub fn product_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
}

/// Create the settings routes router.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(settings::index))
        .route("/{key}", get(settings::show).put(settings::update))
}

/// Create all `/api` routes.
pub fn routes(login_burst: u32, max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(login_burst))
        .nest("/public", public_routes())
        .nest("/categories", category_routes())
        .nest("/products", product_routes(max_upload_bytes))
        .nest("/settings", settings_routes())
        .route("/dashboard/stats", get(dashboard::stats))
}
