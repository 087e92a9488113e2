//! Admin session held by the panel.

use secrecy::{ExposeSecret, SecretString};

use dulce_arte_core::{AdminUserSummary, LoginResponse};

/// Bearer token plus the admin it was issued to.
///
/// Created by a successful login and dropped on logout or when the API
/// rejects the token. `Debug` never prints the token.
#[derive(Debug, Clone)]
pub struct AdminSession {
    token: SecretString,
    user: AdminUserSummary,
}

impl AdminSession {
    #[must_use]
    pub fn new(token: SecretString, user: AdminUserSummary) -> Self {
        Self { token, user }
    }

    #[must_use]
    pub const fn user(&self) -> &AdminUserSummary {
        &self.user
    }

    /// Raw token for the `Authorization` header.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl From<LoginResponse> for AdminSession {
    fn from(response: LoginResponse) -> Self {
        Self::new(SecretString::from(response.token), response.user)
    }
}
