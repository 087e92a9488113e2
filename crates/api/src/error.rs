//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as a JSON body
//! `{"message": "..."}`; server errors are captured to Sentry and their
//! details are never sent to the client.

use axum::{
    Json,
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use dulce_arte_core::{ApiMessage, SettingsError, ValidationErrors};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::uploads::UploadError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Image rejected or could not be stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Request fields failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Unknown key or invalid value for a setting.
    #[error("{0}")]
    Settings(#[from] SettingsError),

    /// Malformed multipart body.
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// Request body is not the expected JSON.
    #[error("Invalid JSON body: {0}")]
    JsonBody(#[from] JsonRejection),

    /// Path parameter could not be parsed.
    #[error("Invalid path: {0}")]
    PathParam(#[from] PathRejection),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::InvalidReference(_) => StatusCode::BAD_REQUEST,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken | AuthError::TokenExpired => StatusCode::FORBIDDEN,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_)
                | AuthError::PasswordHash
                | AuthError::TokenSigning(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Upload(err) => match err {
                UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                UploadError::UnsupportedType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                UploadError::Empty => StatusCode::BAD_REQUEST,
                UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Multipart(err) => err.status(),
            Self::JsonBody(err) => match err {
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => err.status(),
            },
            Self::PathParam(err) => err.status(),
            Self::Settings(SettingsError::UnknownKey(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Validation(_) | Self::Settings(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self, status: StatusCode) -> String {
        if status.is_server_error() {
            return "Internal server error".to_owned();
        }
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(msg) | RepositoryError::InvalidReference(msg)) => {
                capitalize(msg)
            }
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_owned(),
            Self::Auth(AuthError::InvalidToken | AuthError::TokenExpired) => {
                "Invalid or expired token".to_owned()
            }
            Self::Auth(AuthError::UserAlreadyExists) => {
                "An admin with this username or email already exists".to_owned()
            }
            Self::Auth(AuthError::WeakPassword(msg) | AuthError::InvalidUsername(msg)) => {
                capitalize(msg)
            }
            Self::Auth(AuthError::InvalidEmail(_)) => "Invalid email address".to_owned(),
            Self::Multipart(err) => err.body_text(),
            Self::JsonBody(err) => err.body_text(),
            Self::PathParam(err) => err.body_text(),
            _ => self.to_string(),
        }
    }
}

fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let message = self.public_message(status);
        (status, Json(ApiMessage::new(message))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for an authenticated admin.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dulce_arte_core::FieldError;

    async fn body_of(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let msg: ApiMessage = serde_json::from_slice(&bytes).unwrap();
        (status, msg.message)
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, msg) =
            body_of(AppError::Database(RepositoryError::DataCorruption("bad price".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "Internal server error");
    }

    #[tokio::test]
    async fn test_auth_statuses() {
        let (status, msg) = body_of(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(msg, "Invalid credentials");

        let (status, _) = body_of(AuthError::TokenExpired.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_repository_statuses() {
        let (status, msg) =
            body_of(RepositoryError::Conflict("category name already exists".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(msg, "Category name already exists");

        let (status, _) = body_of(RepositoryError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            body_of(RepositoryError::InvalidReference("category does not exist".into()).into())
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_statuses() {
        let (status, _) = body_of(UploadError::TooLarge { max: 5 }.into()).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let (status, _) = body_of(UploadError::UnsupportedType.into()).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_validation_message_lists_fields() {
        let errors = ValidationErrors(vec![FieldError {
            field: "name".into(),
            message: "Name is required".into(),
        }]);
        let (status, msg) = body_of(errors.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(msg.contains("Name is required"));
    }

    #[tokio::test]
    async fn test_unknown_setting_is_not_found() {
        let (status, _) = body_of(SettingsError::UnknownKey("colour".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
