//! Admin authentication extractor.
//!
//! Protected handlers take a [`RequireAdmin`] argument. The bearer token is
//! verified and the admin it names must still exist.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use dulce_arte_core::{AdminUserSummary, ApiMessage};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid admin bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> String {
///     format!("Hello, {}!", admin.username)
/// }
/// ```
pub struct RequireAdmin(pub AdminUserSummary);

/// Why a protected request was turned away.
#[derive(Debug)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header (401).
    MissingToken,
    /// Token is invalid, expired or names a deleted admin (403).
    InvalidToken,
    /// The store failed while resolving the admin.
    Internal(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                Json(ApiMessage::new("Access token required")),
            )
                .into_response(),
            Self::InvalidToken => (
                StatusCode::FORBIDDEN,
                Json(ApiMessage::new("Invalid or expired token")),
            )
                .into_response(),
            Self::Internal(err) => err.into_response(),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

        match state.auth().authenticate(token).await {
            Ok(admin) => {
                tracing::Span::current().record("admin_id", admin.id.as_i32());
                set_sentry_user(&admin.id, &admin.username);
                Ok(Self(admin))
            }
            Err(AuthError::InvalidToken | AuthError::TokenExpired) => {
                Err(AuthRejection::InvalidToken)
            }
            Err(e) => Err(AuthRejection::Internal(e.into())),
        }
    }
}
