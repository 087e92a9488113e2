//! HTTP client for the Dulce Arte API.
//!
//! Public catalog reads need no credentials; admin calls take the
//! [`AdminSession`] explicitly. Error bodies of the form `{"message": ...}`
//! are surfaced as [`ClientError::Api`], and `401`/`403` get their own
//! variants so callers can drop a stale session.

use std::collections::BTreeMap;

use reqwest::{Method, RequestBuilder, Response, StatusCode, multipart};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use url::Url;

use dulce_arte_core::{
    AdminUserSummary, ApiMessage, Category, CategoryDeleted, CategoryForm, CategoryId,
    DashboardStats, LoginRequest, LoginResponse, Product, ProductForm, ProductId, SettingEntry,
    SettingKey, SettingUpdate,
};

use crate::session::AdminSession;

/// Errors that can occur when calling the API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or body decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL or endpoint could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Missing or rejected credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Token invalid or expired (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    /// Whether the session should be dropped and the admin sent back to login.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Forbidden(_))
    }

    /// Message suitable for an inline notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) | Self::Url(_) => "Could not reach the server".to_owned(),
            Self::Unauthorized(message) | Self::Forbidden(message) | Self::Api { message, .. } => {
                message.clone()
            }
        }
    }
}

/// An image picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Dulce Arte API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Create a client for the API at `base_url` (e.g. `http://localhost:3001`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("dulce-arte-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base })
    }

    /// Base URL of the API, always ending in `/`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve a server-relative path such as `/uploads/x.png` against the API.
    ///
    /// The path is taken relative to the base URL, so an API mounted under a
    /// prefix keeps it.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Url> {
        self.base.join(path.trim_start_matches('/')).ok()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        session: Option<&AdminSession>,
    ) -> Result<RequestBuilder, ClientError> {
        let builder = self.http.request(method, self.endpoint(path)?);
        Ok(match session {
            Some(session) => builder.bearer_auth(session.token()),
            None => builder,
        })
    }

    // =========================================================================
    // Public catalog
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn public_categories(&self) -> Result<Vec<Category>, ClientError> {
        let request = self.request(Method::GET, "api/public/categories", None)?;
        send_json(request).await
    }

    /// Available products, optionally of one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn public_products(
        &self,
        category_id: Option<CategoryId>,
    ) -> Result<Vec<Product>, ClientError> {
        let mut url = self.endpoint("api/public/products")?;
        if let Some(id) = category_id {
            url.query_pairs_mut()
                .append_pair("category_id", &id.to_string());
        }
        send_json(self.http.get(url)).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn public_settings(&self) -> Result<BTreeMap<String, String>, ClientError> {
        let request = self.request(Method::GET, "api/public/settings", None)?;
        send_json(request).await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` for wrong credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<AdminSession, ClientError> {
        let body = LoginRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        let request = self
            .request(Method::POST, "api/auth/login", None)?
            .json(&body);
        let response: LoginResponse = send_json(request).await?;
        Ok(response.into())
    }

    /// # Errors
    ///
    /// Returns an auth failure if the session is no longer valid.
    pub async fn me(&self, session: &AdminSession) -> Result<AdminUserSummary, ClientError> {
        send_json(self.request(Method::GET, "api/auth/me", Some(session))?).await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_categories(
        &self,
        session: &AdminSession,
    ) -> Result<Vec<Category>, ClientError> {
        send_json(self.request(Method::GET, "api/categories", Some(session))?).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails (`409` for a duplicate name).
    pub async fn create_category(
        &self,
        session: &AdminSession,
        form: &CategoryForm,
    ) -> Result<Category, ClientError> {
        self.send_body(Method::POST, "api/categories", session, form)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn update_category(
        &self,
        session: &AdminSession,
        id: CategoryId,
        form: &CategoryForm,
    ) -> Result<Category, ClientError> {
        self.send_body(Method::PUT, &format!("api/categories/{id}"), session, form)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_category(
        &self,
        session: &AdminSession,
        id: CategoryId,
    ) -> Result<CategoryDeleted, ClientError> {
        let request = self.request(Method::DELETE, &format!("api/categories/{id}"), Some(session))?;
        send_json(request).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Every product, any status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_products(&self, session: &AdminSession) -> Result<Vec<Product>, ClientError> {
        send_json(self.request(Method::GET, "api/products", Some(session))?).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_product(
        &self,
        session: &AdminSession,
        form: &ProductForm,
        image: Option<&ImageFile>,
    ) -> Result<Product, ClientError> {
        let request = self
            .request(Method::POST, "api/products", Some(session))?
            .multipart(product_multipart(form, image)?);
        send_json(request).await
    }

    /// Without an image the product keeps its current one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn update_product(
        &self,
        session: &AdminSession,
        id: ProductId,
        form: &ProductForm,
        image: Option<&ImageFile>,
    ) -> Result<Product, ClientError> {
        let request = self
            .request(Method::PUT, &format!("api/products/{id}"), Some(session))?
            .multipart(product_multipart(form, image)?);
        send_json(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_product(
        &self,
        session: &AdminSession,
        id: ProductId,
    ) -> Result<ApiMessage, ClientError> {
        let request = self.request(Method::DELETE, &format!("api/products/{id}"), Some(session))?;
        send_json(request).await
    }

    // =========================================================================
    // Settings and dashboard
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn settings(
        &self,
        session: &AdminSession,
    ) -> Result<BTreeMap<String, String>, ClientError> {
        send_json(self.request(Method::GET, "api/settings", Some(session))?).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_setting(
        &self,
        session: &AdminSession,
        key: SettingKey,
    ) -> Result<SettingEntry, ClientError> {
        let request = self.request(Method::GET, &format!("api/settings/{key}"), Some(session))?;
        send_json(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails (`400` for an invalid value).
    pub async fn update_setting(
        &self,
        session: &AdminSession,
        key: SettingKey,
        value: &str,
    ) -> Result<SettingEntry, ClientError> {
        let body = SettingUpdate {
            value: value.to_owned(),
        };
        self.send_body(Method::PUT, &format!("api/settings/{key}"), session, &body)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn dashboard_stats(&self, session: &AdminSession) -> Result<DashboardStats, ClientError> {
        send_json(self.request(Method::GET, "api/dashboard/stats", Some(session))?).await
    }

    async fn send_body<B, T>(
        &self,
        method: Method,
        path: &str,
        session: &AdminSession,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = self.request(method, path, Some(session))?.json(body);
        send_json(request).await
    }
}

/// Multipart body for product create/update.
fn product_multipart(
    form: &ProductForm,
    image: Option<&ImageFile>,
) -> Result<multipart::Form, ClientError> {
    let mut body = multipart::Form::new()
        .text("name", form.name.clone())
        .text("description", form.description.clone())
        .text("price", form.price.clone())
        .text("category_id", form.category_id.clone())
        .text("status", form.status.clone());

    if let Some(image) = image {
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        body = body.part("image", part);
    }

    Ok(body)
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = check(request.send().await?).await?;
    Ok(response.json().await?)
}

/// Turn a non-success response into a `ClientError`.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&text)
        .map(|body| body.message)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_owned()
            } else {
                text
            }
        });

    tracing::debug!(status = status.as_u16(), %message, "API request failed");

    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::new("http://localhost:3001/backend").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:3001/backend/");
        assert_eq!(
            client.endpoint("api/public/products").unwrap().as_str(),
            "http://localhost:3001/backend/api/public/products"
        );
    }

    #[test]
    fn test_resolve_upload_path() {
        let client = ApiClient::new("http://localhost:3001").unwrap();
        assert_eq!(
            client.resolve("/uploads/product-1.png").unwrap().as_str(),
            "http://localhost:3001/uploads/product-1.png"
        );

        let mounted = ApiClient::new("https://dulcearte.com/backend").unwrap();
        assert_eq!(
            mounted.resolve("/uploads/product-1.png").unwrap().as_str(),
            "https://dulcearte.com/backend/uploads/product-1.png"
        );
        assert_eq!(
            mounted
                .resolve("https://cdn.dulcearte.com/product-1.png")
                .unwrap()
                .as_str(),
            "https://cdn.dulcearte.com/product-1.png"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(ClientError::Url(_))));
    }

    #[test]
    fn test_auth_failure_classification() {
        assert!(ClientError::Unauthorized("x".into()).is_auth_failure());
        assert!(ClientError::Forbidden("x".into()).is_auth_failure());
        assert!(
            !ClientError::Api {
                status: 409,
                message: "x".into()
            }
            .is_auth_failure()
        );
    }
}
