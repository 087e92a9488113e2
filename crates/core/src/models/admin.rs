//! Admin authentication, dashboard and settings payloads.

use serde::{Deserialize, Serialize};

use crate::types::{AdminUserId, Email, SettingKey};

/// Public view of an admin user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUserSummary {
    pub id: AdminUserId,
    pub username: String,
    pub email: Email,
    pub name: String,
}

/// Body of `POST /api/auth/login`. `username` may also be the admin's email.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful login.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AdminUserSummary,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_categories: i64,
    pub available_products: i64,
}

/// One setting with its description, as returned by `GET /api/settings/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: SettingKey,
    pub value: String,
    pub description: Option<String>,
}

/// Body of `PUT /api/settings/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingUpdate {
    pub value: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_debug_redacts_password() {
        let req = LoginRequest {
            username: "admin".to_owned(),
            password: "admin123".to_owned(),
        };
        let debug = format!("{req:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("admin123"));
    }

    #[test]
    fn test_setting_entry_serializes_key_as_string() {
        let entry = SettingEntry {
            key: SettingKey::HeroVisible,
            value: "true".to_owned(),
            description: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["key"], "hero_visible");
    }
}
