//! Settings updates and their public visibility.

use dulce_arte_core::{SettingKey, SiteSettings};
use dulce_arte_integration_tests::TestApp;
use dulce_arte_storefront::ClientError;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_update_is_visible_on_public_route() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let session = app.admin_session().await;

    let before = client.public_settings().await.expect("public failed");
    assert_eq!(before.get("hero_visible").map(String::as_str), Some("true"));

    let entry = client
        .update_setting(&session, SettingKey::HeroVisible, "false")
        .await
        .expect("update failed");
    assert_eq!(entry.value, "false");

    let after = client.public_settings().await.expect("public failed");
    assert_eq!(after.get("hero_visible").map(String::as_str), Some("false"));
    assert!(!SiteSettings::from_pairs(after).hero_visible);
}

#[tokio::test]
async fn test_text_setting_is_trimmed_and_stored() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let session = app.admin_session().await;

    client
        .update_setting(&session, SettingKey::ContactPhone, "  +56 9 1234 5678 ")
        .await
        .expect("update failed");

    let entry = client
        .get_setting(&session, SettingKey::ContactPhone)
        .await
        .expect("get failed");
    assert_eq!(entry.value, "+56 9 1234 5678");
    assert!(entry.description.is_some());
}

#[tokio::test]
async fn test_invalid_flag_value_is_400() {
    let app = TestApp::spawn().await;
    let session = app.admin_session().await;

    let err = app
        .client()
        .update_setting(&session, SettingKey::HeroVisible, "sometimes")
        .await
        .expect_err("invalid flag must fail");
    assert!(matches!(err, ClientError::Api { status: 400, .. }));
}

#[tokio::test]
async fn test_unknown_key_is_404() {
    let app = TestApp::spawn().await;
    let session = app.admin_session().await;

    let resp = app
        .http
        .put(app.url("/api/settings/favorite_color"))
        .bearer_auth(session.token())
        .json(&json!({ "value": "pink" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_legacy_key_alias_is_accepted() {
    let app = TestApp::spawn().await;
    let session = app.admin_session().await;

    let resp = app
        .http
        .put(app.url("/api/settings/show_hero"))
        .bearer_auth(session.token())
        .json(&json!({ "value": "false" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let public = app.client().public_settings().await.expect("public failed");
    assert_eq!(public.get("hero_visible").map(String::as_str), Some("false"));
}
