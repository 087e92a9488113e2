//! Read-only catalog for the storefront.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use dulce_arte_core::{Category, CategoryId, Product, SiteSettings};

use crate::db::ProductFilter;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query for the public product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Empty means every category.
    pub category_id: Option<String>,
}

impl ProductQuery {
    fn category_id(&self) -> Result<Option<CategoryId>> {
        match self.category_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<CategoryId>()
                .map(Some)
                .map_err(|_| AppError::BadRequest("Invalid category_id".to_owned())),
        }
    }
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.store().list_categories().await?))
}

/// Available products, newest first.
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = ProductFilter::public(query.category_id()?);
    Ok(Json(state.store().list_products(filter).await?))
}

/// Settings as a flat `key -> value` map.
pub async fn settings(State(state): State<AppState>) -> Result<Json<BTreeMap<String, String>>> {
    settings_map(&state).await.map(Json)
}

pub(crate) async fn settings_map(state: &AppState) -> Result<BTreeMap<String, String>> {
    let stored = state.store().list_settings().await?;
    let settings = SiteSettings::from_pairs(stored.iter().map(|s| (s.key.as_str(), &s.value)));
    Ok(settings.to_map())
}
