//! Product image uploads: type and size checks, replacement and cleanup.

use dulce_arte_core::{CategoryId, ProductForm};
use dulce_arte_integration_tests::{TestApp, png_bytes};
use dulce_arte_storefront::{ClientError, ImageFile};
use reqwest::{StatusCode, multipart};

fn form(category: CategoryId) -> ProductForm {
    ProductForm {
        name: "Cupcake de vainilla".to_owned(),
        description: String::new(),
        price: "2500".to_owned(),
        category_id: category.to_string(),
        status: String::new(),
    }
}

fn png(name: &str) -> ImageFile {
    ImageFile {
        file_name: name.to_owned(),
        content_type: "image/png".to_owned(),
        bytes: png_bytes(),
    }
}

async fn first_category(app: &TestApp) -> CategoryId {
    let session = app.admin_session().await;
    app.client()
        .list_categories(&session)
        .await
        .expect("list failed")[0]
        .id
}

#[tokio::test]
async fn test_image_is_stored_and_served() {
    let app = TestApp::spawn().await;
    let session = app.admin_session().await;
    let category = first_category(&app).await;

    let product = app
        .client()
        .create_product(&session, &form(category), Some(&png("vainilla.png")))
        .await
        .expect("create failed");
    let url = product.image_url.expect("image stored");
    assert!(url.starts_with("/uploads/product-"));
    assert!(
        std::path::Path::new(&url)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
    );

    let resp = app.http.get(app.url(&url)).send().await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.bytes().await.expect("No body");
    assert_eq!(body.as_ref(), png_bytes().as_slice());
}

#[tokio::test]
async fn test_unsupported_type_writes_nothing() {
    let app = TestApp::spawn().await;
    let session = app.admin_session().await;
    let category = first_category(&app).await;

    let pdf = ImageFile {
        file_name: "menu.pdf".to_owned(),
        content_type: "application/pdf".to_owned(),
        bytes: b"%PDF-1.7".to_vec(),
    };
    let err = app
        .client()
        .create_product(&session, &form(category), Some(&pdf))
        .await
        .expect_err("pdf must be rejected");
    assert!(matches!(err, ClientError::Api { status: 415, .. }));

    assert!(app.uploaded_files().is_empty());
    assert!(app.client().list_products(&session).await.expect("list failed").is_empty());
}

#[tokio::test]
async fn test_mismatched_extension_is_rejected() {
    let app = TestApp::spawn().await;
    let session = app.admin_session().await;
    let category = first_category(&app).await;

    let disguised = ImageFile {
        file_name: "script.sh".to_owned(),
        content_type: "image/png".to_owned(),
        bytes: png_bytes(),
    };
    let err = app
        .client()
        .create_product(&session, &form(category), Some(&disguised))
        .await
        .expect_err("bad extension must be rejected");
    assert!(matches!(err, ClientError::Api { status: 415, .. }));
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn test_oversized_image_is_413() {
    let app = TestApp::spawn_with(|config| config.max_upload_bytes = 1024).await;
    let session = app.admin_session().await;
    let category = first_category(&app).await;

    let big = ImageFile {
        file_name: "grande.jpg".to_owned(),
        content_type: "image/jpeg".to_owned(),
        bytes: vec![0xFF; 4096],
    };
    let err = app
        .client()
        .create_product(&session, &form(category), Some(&big))
        .await
        .expect_err("oversized image must be rejected");
    assert!(matches!(err, ClientError::Api { status: 413, .. }));
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn test_invalid_fields_reject_before_storing_image() {
    let app = TestApp::spawn().await;
    let session = app.admin_session().await;

    let body = multipart::Form::new()
        .text("name", "")
        .text("price", "abc")
        .part(
            "image",
            multipart::Part::bytes(png_bytes())
                .file_name("x.png")
                .mime_str("image/png")
                .expect("valid mime"),
        );
    let resp = app
        .http
        .post(app.url("/api/products"))
        .bearer_auth(session.token())
        .multipart(body)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn test_replacing_image_deletes_old_file() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let session = app.admin_session().await;
    let category = first_category(&app).await;

    let product = client
        .create_product(&session, &form(category), Some(&png("uno.png")))
        .await
        .expect("create failed");
    let old_url = product.image_url.clone().expect("image stored");

    // No new image keeps the current one.
    let unchanged = client
        .update_product(&session, product.id, &form(category), None)
        .await
        .expect("update failed");
    assert_eq!(unchanged.image_url.as_deref(), Some(old_url.as_str()));

    let replaced = client
        .update_product(&session, product.id, &form(category), Some(&png("dos.png")))
        .await
        .expect("update failed");
    let new_url = replaced.image_url.expect("image stored");
    assert_ne!(new_url, old_url);

    assert!(!app.upload_path(&old_url).exists());
    assert!(app.upload_path(&new_url).exists());
    assert_eq!(app.uploaded_files().len(), 1);
}

#[tokio::test]
async fn test_deleting_product_removes_image() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let session = app.admin_session().await;
    let category = first_category(&app).await;

    let product = client
        .create_product(&session, &form(category), Some(&png("borrar.png")))
        .await
        .expect("create failed");
    assert_eq!(app.uploaded_files().len(), 1);

    client
        .delete_product(&session, product.id)
        .await
        .expect("delete failed");
    assert!(app.uploaded_files().is_empty());
}
