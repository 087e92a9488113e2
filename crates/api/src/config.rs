//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `API_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string,
//!   unless `API_STORE=memory`
//!
//! ## Optional
//! - `API_STORE` - `postgres` (default) or `memory`
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 3001)
//! - `API_TOKEN_TTL_HOURS` - Admin token lifetime (default: 24)
//! - `API_UPLOAD_DIR` - Product image directory (default: uploads)
//! - `API_MAX_UPLOAD_BYTES` - Product image size limit (default: 5 MiB)
//! - `API_CORS_ORIGINS` - Comma-separated allowed origins (default: any)
//! - `API_LOGIN_BURST` - Login attempts allowed per client before throttling (default: 5)
//! - `API_SEED_ADMIN_PASSWORD` - Memory store only: seed the admin with this password
//! - `CATEGORY_DELETE_POLICY` - `set_null` (default) or `cascade`
//! - `LOG_FORMAT` - `text` (default) or `json`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use dulce_arte_core::DeletePolicy;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default product image size limit (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where catalog data lives.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// `PostgreSQL` at the given URL (contains password).
    Postgres { database_url: SecretString },
    /// In-process store; data is lost on restart.
    Memory,
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Persistence provider
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// HS256 signing secret for admin tokens
    pub jwt_secret: SecretString,
    /// Admin token lifetime
    pub token_ttl: Duration,
    /// Directory product images are written to and served from
    pub upload_dir: PathBuf,
    /// Largest accepted product image, in bytes
    pub max_upload_bytes: usize,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    /// Login attempts allowed per client before throttling
    pub login_burst: u32,
    /// What deleting a category does to its products
    pub category_delete_policy: DeletePolicy,
    /// Password for the admin seeded into the memory store
    pub seed_admin_password: Option<SecretString>,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store = match get_env_or_default("API_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: get_database_url("API_DATABASE_URL")?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "API_STORE".to_owned(),
                    format!("expected postgres or memory, got {other}"),
                ));
            }
        };

        let host = parse_env("API_HOST", "127.0.0.1")?;
        let port = parse_env("API_PORT", "3001")?;

        let jwt_secret = get_validated_secret("API_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "API_JWT_SECRET")?;

        let token_ttl = token_ttl_from_hours(parse_env("API_TOKEN_TTL_HOURS", "24")?)?;

        let category_delete_policy = get_env_or_default("CATEGORY_DELETE_POLICY", "set_null")
            .parse::<DeletePolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("CATEGORY_DELETE_POLICY".to_owned(), e))?;

        let cors_origins = get_optional_env("API_CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let log_json = match get_env_or_default("LOG_FORMAT", "text").as_str() {
            "json" => true,
            "text" => false,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_owned(),
                    format!("expected text or json, got {other}"),
                ));
            }
        };

        Ok(Self {
            store,
            host,
            port,
            jwt_secret,
            token_ttl,
            upload_dir: PathBuf::from(get_env_or_default("API_UPLOAD_DIR", "uploads")),
            max_upload_bytes: parse_env("API_MAX_UPLOAD_BYTES", "5242880")?,
            cors_origins,
            login_burst: parse_env("API_LOGIN_BURST", "5")?,
            category_delete_policy,
            seed_admin_password: get_optional_env("API_SEED_ADMIN_PASSWORD").map(SecretString::from),
            log_json,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration for an in-memory server, used by local runs and tests.
    ///
    /// The secret is taken as-is without strength checks.
    #[must_use]
    pub fn in_memory(upload_dir: PathBuf, jwt_secret: SecretString) -> Self {
        Self {
            store: StoreBackend::Memory,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            jwt_secret,
            token_ttl: Duration::from_secs(24 * 3600),
            upload_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origins: Vec::new(),
            login_burst: 5,
            category_delete_policy: DeletePolicy::SetNull,
            seed_admin_password: None,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Token lifetime for `API_TOKEN_TTL_HOURS`.
fn token_ttl_from_hours(hours: u64) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| {
        ConfigError::InvalidEnvVar("API_TOKEN_TTL_HOURS".to_owned(), reason.to_owned())
    };
    if hours == 0 {
        return Err(invalid("must be at least 1"));
    }
    // Token expiry is an i64 unix timestamp.
    hours
        .checked_mul(3600)
        .filter(|secs| i64::try_from(*secs).is_ok())
        .map(Duration::from_secs)
        .ok_or_else(|| invalid("too large"))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ttl_from_hours() {
        assert_eq!(
            token_ttl_from_hours(24).unwrap(),
            Duration::from_secs(24 * 3600)
        );
        assert!(matches!(
            token_ttl_from_hours(0),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            token_ttl_from_hours(u64::MAX),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(token_ttl_from_hours(u64::MAX / 3600).is_err());
    }

    #[test]
    fn test_shannon_entropy_edges() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        let err = validate_secret_strength("changeme-jwt-key-for-bakery", "API_JWT_SECRET")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("your-jwt-key", "API_JWT_SECRET").is_err());
    }

    #[test]
    fn test_validate_secret_strength_rejects_low_entropy() {
        assert!(validate_secret_strength(&"ab".repeat(20), "API_JWT_SECRET").is_err());
    }

    #[test]
    fn test_validate_secret_strength_accepts_random() {
        assert!(validate_secret_strength("q8Zt!c2Lw#9Vn$4Rk&7Hy*1Pj^6Md@3F", "API_JWT_SECRET").is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "API_JWT_SECRET").is_err());
        assert!(validate_secret_length(&SecretString::from("k".repeat(32)), "API_JWT_SECRET").is_ok());
    }

    #[test]
    fn test_in_memory_defaults() {
        let config = ApiConfig::in_memory(PathBuf::from("/tmp/uploads"), SecretString::from("k"));
        assert!(matches!(config.store, StoreBackend::Memory));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.category_delete_policy, DeletePolicy::SetNull);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:0");
    }
}
