//! Site settings management.

use std::collections::BTreeMap;

use axum::{Json, extract::State};

use dulce_arte_core::{SettingEntry, SettingKey, SettingUpdate};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::routes::public::settings_map;
use crate::state::AppState;

/// Every setting as a flat map, same shape as the public read.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<BTreeMap<String, String>>> {
    settings_map(&state).await.map(Json)
}

/// One setting. A known key that was never stored reports its default.
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(key): ApiPath<String>,
) -> Result<Json<SettingEntry>> {
    let key: SettingKey = key.parse()?;
    let entry = match state.store().get_setting(key).await? {
        Some(stored) => SettingEntry {
            key,
            value: stored.value,
            description: stored
                .description
                .or_else(|| Some(key.description().to_owned())),
        },
        None => SettingEntry {
            key,
            value: key.default_value().to_owned(),
            description: Some(key.description().to_owned()),
        },
    };
    Ok(Json(entry))
}

/// Validate and store one setting.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(key): ApiPath<String>,
    ApiJson(body): ApiJson<SettingUpdate>,
) -> Result<Json<SettingEntry>> {
    let key: SettingKey = key.parse()?;
    let value = key.normalize(&body.value)?;
    let stored = state.store().upsert_setting(key, &value).await?;

    tracing::info!(key = %key, admin = %admin.username, "Setting updated");
    Ok(Json(SettingEntry {
        key,
        value: stored.value,
        description: stored.description,
    }))
}
