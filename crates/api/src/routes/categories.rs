//! Category management.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use dulce_arte_core::{Category, CategoryDeleted, CategoryForm, CategoryId, DeletePolicy};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.store().list_categories().await?))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>> {
    state
        .store()
        .get_category(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_owned()))
}

pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Result<(StatusCode, Json<Category>)> {
    let input = form.validate()?;
    let category = state.store().create_category(&input).await?;

    tracing::info!(
        category_id = %category.id,
        name = %category.name,
        admin = %admin.username,
        "Category created"
    );
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Result<Json<Category>> {
    let input = form.validate()?;
    let category = state.store().update_category(id, &input).await?;

    tracing::info!(category_id = %id, admin = %admin.username, "Category updated");
    Ok(Json(category))
}

/// Delete a category; its products are detached or deleted according to the
/// configured [`DeletePolicy`].
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<CategoryDeleted>> {
    let policy = state.config().category_delete_policy;
    let removal = state.store().delete_category(id, policy).await?;

    // Rows are gone; image cleanup is best effort.
    state.uploads().remove_all(&removal.orphaned_images).await;

    tracing::info!(
        category_id = %id,
        %policy,
        affected_products = removal.affected_products,
        admin = %admin.username,
        "Category deleted"
    );

    let message = match policy {
        DeletePolicy::SetNull => "Category deleted; its products are now uncategorized",
        DeletePolicy::Cascade => "Category deleted along with its products",
    };
    Ok(Json(CategoryDeleted {
        message: message.to_owned(),
        policy,
        affected_products: removal.affected_products,
    }))
}
