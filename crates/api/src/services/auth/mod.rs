//! Authentication service.
//!
//! Admin passwords are stored as argon2id PHC strings. A successful login
//! returns an HS256 bearer token carrying the admin id and username.

mod error;

pub use error::AuthError;

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use dulce_arte_core::{AdminUserId, AdminUserSummary, Email, LoginResponse};

use crate::db::{CatalogStore, NewAdminUser, RepositoryError};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 50;

/// Claims carried by an admin token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin user id, as a decimal string.
    pub sub: String,
    pub username: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// The admin id in `sub`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not an id.
    pub fn admin_id(&self) -> Result<AdminUserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Signing and verification keys for admin tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    /// Sign a token for `admin`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, admin: &AdminUserSummary) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: admin.id.to_string(),
            username: admin.username.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(AuthError::TokenSigning)
    }

    /// Check signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for an expired token and
    /// `AuthError::InvalidToken` for anything else that fails to verify.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

/// Authentication service.
///
/// Borrowed per request from the application state.
pub struct AuthService<'a> {
    store: &'a dyn CatalogStore,
    keys: &'a TokenKeys,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn CatalogStore, keys: &'a TokenKeys) -> Self {
        Self { store, keys }
    }

    /// Login with username (or email) and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no admin matches or the
    /// password is wrong. No token is issued in that case.
    pub async fn login(&self, login: &str, password: &str) -> Result<LoginResponse, AuthError> {
        if login.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let credentials = self
            .store
            .find_admin_by_login(login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        let token = self.keys.issue(&credentials.user)?;
        Ok(LoginResponse {
            token,
            user: credentials.user,
        })
    }

    /// Resolve a bearer token to the admin it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token does not verify or the
    /// admin no longer exists, `AuthError::TokenExpired` if it expired.
    pub async fn authenticate(&self, token: &str) -> Result<AdminUserSummary, AuthError> {
        let claims = self.keys.verify(token)?;
        self.store
            .get_admin(claims.admin_id()?)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` for bad input, and
    /// `AuthError::UserAlreadyExists` if the username or email is taken.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AdminUserSummary, AuthError> {
        let input = new_admin(username, email, name, password)?;
        self.store.create_admin(&input).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })
    }
}

/// Validate input and hash the password for a new admin account.
///
/// # Errors
///
/// See [`AuthService::create_admin`].
pub fn new_admin(
    username: &str,
    email: &str,
    name: &str,
    password: &str,
) -> Result<NewAdminUser, AuthError> {
    let username = validate_username(username)?;
    let email = Email::parse(email)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let name = name.trim();
    Ok(NewAdminUser {
        name: if name.is_empty() {
            username.clone()
        } else {
            name.to_owned()
        },
        username,
        email,
        password_hash,
    })
}

fn validate_username(username: &str) -> Result<String, AuthError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username cannot be empty".to_owned()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(AuthError::InvalidUsername(
            "username may only contain letters, digits, '.', '_' and '-'".to_owned(),
        ));
    }
    Ok(username.to_owned())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
