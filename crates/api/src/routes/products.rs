//! Product management, including image upload.
//!
//! Create and update take a multipart body. Nothing is written until every
//! field has been read and validated and the image type checked; the image
//! file is then written before the row, and removed again if the row write
//! fails.

use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
};

use dulce_arte_core::{ApiMessage, CategoryId, NewProduct, Product, ProductForm, ProductId};

use crate::db::ProductFilter;
use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::middleware::RequireAdmin;
use crate::services::uploads::{ImageUpload, UploadError};
use crate::state::AppState;

/// Multipart field carrying the image file.
const IMAGE_FIELD: &str = "image";

/// Everything a product multipart body carried.
#[derive(Debug, Default)]
struct ProductSubmission {
    form: ProductForm,
    image: Option<ImageUpload>,
}

/// Read every field. Unknown fields are ignored.
async fn read_submission(mut multipart: Multipart, max_bytes: usize) -> Result<ProductSubmission> {
    let mut submission = ProductSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            IMAGE_FIELD => submission.image = read_image(field, max_bytes).await?,
            "name" => submission.form.name = field.text().await?,
            "description" => submission.form.description = field.text().await?,
            "price" => submission.form.price = field.text().await?,
            "category_id" => submission.form.category_id = field.text().await?,
            "status" => submission.form.status = field.text().await?,
            _ => {}
        }
    }

    Ok(submission)
}

/// Read the image part with a hard size limit.
///
/// A part without a file name and without content is what browsers send when
/// no file was chosen, so it counts as no image.
async fn read_image(mut field: Field<'_>, max_bytes: usize) -> Result<Option<ImageUpload>> {
    let file_name = field
        .file_name()
        .filter(|name| !name.is_empty())
        .map(str::to_owned);
    let content_type = field.content_type().map(str::to_owned);

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if bytes.len().saturating_add(chunk.len()) > max_bytes {
            return Err(UploadError::TooLarge { max: max_bytes }.into());
        }
        bytes.extend_from_slice(&chunk);
    }

    if file_name.is_none() && bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImageUpload {
        file_name,
        content_type,
        bytes,
    }))
}

/// Validate fields and image type, then make sure the category exists.
async fn prepare(state: &AppState, submission: &ProductSubmission) -> Result<NewProduct> {
    let input = submission.form.validate()?;
    if let Some(image) = &submission.image {
        state.uploads().check(image)?;
    }
    ensure_category(state, input.category_id).await?;
    Ok(input)
}

async fn ensure_category(state: &AppState, id: CategoryId) -> Result<()> {
    match state.store().get_category(id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest("Category does not exist".to_owned())),
    }
}

async fn save_image(state: &AppState, image: Option<&ImageUpload>) -> Result<Option<String>> {
    match image {
        Some(image) => Ok(Some(state.uploads().save(image).await?)),
        None => Ok(None),
    }
}

/// Every product, any status, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        state
            .store()
            .list_products(ProductFilter::default())
            .await?,
    ))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    state
        .store()
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}

pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>)> {
    let submission = read_submission(multipart, state.uploads().max_bytes()).await?;
    let input = prepare(&state, &submission).await?;
    let image_url = save_image(&state, submission.image.as_ref()).await?;

    let product = match state
        .store()
        .create_product(&input, image_url.as_deref())
        .await
    {
        Ok(product) => product,
        Err(e) => {
            if let Some(url) = &image_url {
                state.uploads().remove(url).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        product_id = %product.id,
        name = %product.name,
        has_image = product.image_url.is_some(),
        admin = %admin.username,
        "Product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace every field. Without a new image the current one is kept; with
/// one, the previous file is deleted once the row is updated.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    multipart: Multipart,
) -> Result<Json<Product>> {
    let submission = read_submission(multipart, state.uploads().max_bytes()).await?;
    let input = submission.form.validate()?;
    if let Some(image) = &submission.image {
        state.uploads().check(image)?;
    }

    let existing = state
        .store()
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;
    ensure_category(&state, input.category_id).await?;

    let image_url = save_image(&state, submission.image.as_ref()).await?;

    let product = match state
        .store()
        .update_product(id, &input, image_url.as_deref())
        .await
    {
        Ok(product) => product,
        Err(e) => {
            if let Some(url) = &image_url {
                state.uploads().remove(url).await;
            }
            return Err(e.into());
        }
    };

    if let (Some(new_url), Some(old_url)) = (&image_url, &existing.image_url)
        && new_url != old_url
    {
        state.uploads().remove(old_url).await;
    }

    tracing::info!(
        product_id = %id,
        image_replaced = image_url.is_some(),
        admin = %admin.username,
        "Product updated"
    );
    Ok(Json(product))
}

pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ApiMessage>> {
    let product = state.store().delete_product(id).await?;
    if let Some(url) = &product.image_url {
        state.uploads().remove(url).await;
    }

    tracing::info!(product_id = %id, admin = %admin.username, "Product deleted");
    Ok(Json(ApiMessage::new("Product deleted")))
}
