//! Admin login and session check.

use axum::{Json, extract::State};

use dulce_arte_core::{AdminUserSummary, LoginRequest, LoginResponse};

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::RequireAdmin;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Exchange username (or email) and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    match state.auth().login(&req.username, &req.password).await {
        Ok(response) => {
            tracing::info!(admin_id = %response.user.id, username = %response.user.username, "Admin logged in");
            Ok(Json(response))
        }
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::warn!(login = %req.username, "Failed admin login");
            }
            Err(e.into())
        }
    }
}

/// The admin the bearer token belongs to.
pub async fn me(RequireAdmin(admin): RequireAdmin) -> Json<AdminUserSummary> {
    Json(admin)
}
