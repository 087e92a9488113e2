//! Public storefront and admin panel driven against a live API.

use dulce_arte_core::{DeletePolicy, SettingKey};
use dulce_arte_integration_tests::{ADMIN_PASSWORD, TestApp, png_bytes};
use dulce_arte_storefront::admin::{EditorMode, Notice, SESSION_EXPIRED};
use dulce_arte_storefront::catalog::PLACEHOLDER_IMAGE;
use dulce_arte_storefront::{
    AdminPanel, AdminTab, AdminView, CatalogSource, CategoryTab, ImageFile, PanelError, Storefront,
};
use secrecy::SecretString;

async fn logged_in_panel(app: &TestApp) -> AdminPanel {
    let mut panel = AdminPanel::new(app.client());
    panel.open_admin();
    panel.username = "admin".to_owned();
    panel.password = ADMIN_PASSWORD.to_owned();
    panel.submit_login().await.expect("login failed");
    panel
}

#[tokio::test]
async fn test_storefront_loads_seeded_catalog() {
    let app = TestApp::spawn().await;

    let storefront = Storefront::load(&app.client()).await;
    assert_eq!(storefront.source(), CatalogSource::Api);
    assert_eq!(storefront.categories().len(), 4);
    assert!(storefront.visible_products().is_empty());
    assert!(storefront.hero_visible());
    assert_eq!(storefront.settings().hero_title.as_deref(), Some("Dulce Arte"));
}

#[tokio::test]
async fn test_login_opens_home_with_stats() {
    let app = TestApp::spawn().await;
    let panel = logged_in_panel(&app).await;

    assert_eq!(panel.view(), AdminView::Panel);
    assert_eq!(panel.active_tab(), AdminTab::Home);
    assert!(panel.password.is_empty());
    assert_eq!(panel.stats().map(|s| s.total_categories), Some(4));
}

#[tokio::test]
async fn test_wrong_password_stays_on_login_form() {
    let app = TestApp::spawn().await;
    let mut panel = AdminPanel::new(app.client());
    panel.open_admin();
    panel.username = "admin".to_owned();
    panel.password = "incorrecta".to_owned();

    assert!(matches!(
        panel.submit_login().await,
        Err(PanelError::Request(_))
    ));
    assert_eq!(panel.view(), AdminView::LoginForm);
    assert!(panel.session().is_none());
    assert_eq!(panel.login_error(), Some("Invalid username or password"));
}

#[tokio::test]
async fn test_admin_creates_product_and_storefront_shows_it() {
    let app = TestApp::spawn().await;
    let mut panel = logged_in_panel(&app).await;

    panel
        .select_tab(AdminTab::Products)
        .await
        .expect("products tab failed");
    assert!(panel.is_loaded(AdminTab::Products));
    let cupcakes = panel
        .categories()
        .iter()
        .find(|c| c.name == "Cupcakes")
        .expect("Cupcakes is seeded")
        .id;

    panel.new_product();
    let editor = panel.product_editor_mut().expect("form open");
    editor.form.name = "Cupcake red velvet".to_owned();
    editor.form.price = "2800".to_owned();
    editor.form.category_id = cupcakes.to_string();
    editor.image = Some(ImageFile {
        file_name: "red-velvet.png".to_owned(),
        content_type: "image/png".to_owned(),
        bytes: png_bytes(),
    });
    panel.submit_product_form().await.expect("create failed");

    assert!(panel.product_editor().is_none());
    assert_eq!(panel.products().len(), 1);
    assert_eq!(
        panel.notice(),
        Some(&Notice::Success("Product created".to_owned()))
    );

    let mut storefront = Storefront::load(&app.client()).await;
    storefront.select_tab(CategoryTab::Category(cupcakes));
    let visible = storefront.visible_products();
    assert_eq!(visible.len(), 1);
    let product = visible[0];
    assert_eq!(storefront.category_label(product), "Cupcakes");
    assert_eq!(Storefront::price_label(product), "$2,800");

    let image = storefront.image_url(product);
    assert_ne!(image, PLACEHOLDER_IMAGE);
    let resp = app.http.get(&image).send().await.expect("image request failed");
    assert!(resp.status().is_success());
}

#[tokio::test]
async fn test_edit_product_from_loaded_list() {
    let app = TestApp::spawn().await;
    let mut panel = logged_in_panel(&app).await;
    panel.select_tab(AdminTab::Products).await.expect("tab failed");
    let category = panel.categories()[0].id;

    panel.new_product();
    let editor = panel.product_editor_mut().expect("form open");
    editor.form.name = "Brownie".to_owned();
    editor.form.price = "1200".to_owned();
    editor.form.category_id = category.to_string();
    panel.submit_product_form().await.expect("create failed");
    let id = panel.products()[0].id;

    panel.edit_product(id).expect("edit failed");
    let editor = panel.product_editor_mut().expect("form open");
    assert_eq!(editor.mode, EditorMode::Edit(id));
    editor.form.status = "sold_out".to_owned();
    panel.submit_product_form().await.expect("update failed");

    assert_eq!(panel.products().len(), 1);
    assert!(!panel.products()[0].is_available());
    assert!(Storefront::load(&app.client()).await.visible_products().is_empty());
}

#[tokio::test]
async fn test_category_delete_updates_loaded_products() {
    let app = TestApp::spawn().await;
    let mut panel = logged_in_panel(&app).await;

    panel.select_tab(AdminTab::Categories).await.expect("tab failed");
    panel.new_category();
    panel.category_editor_mut().expect("form open").form.name = "Chocolates".to_owned();
    panel.submit_category_form().await.expect("create category failed");
    let chocolates = panel
        .categories()
        .iter()
        .find(|c| c.name == "Chocolates")
        .expect("category listed")
        .id;

    panel.select_tab(AdminTab::Products).await.expect("tab failed");
    panel.new_product();
    let editor = panel.product_editor_mut().expect("form open");
    editor.form.name = "Trufas".to_owned();
    editor.form.price = "900".to_owned();
    editor.form.category_id = chocolates.to_string();
    panel.submit_product_form().await.expect("create product failed");

    panel.delete_category(chocolates).await.expect("delete failed");
    assert!(panel.categories().iter().all(|c| c.id != chocolates));
    assert_eq!(panel.products().len(), 1);
    assert!(panel.products()[0].category_id.is_none());
    assert!(matches!(panel.notice(), Some(Notice::Success(_))));

    let storefront = Storefront::load(&app.client()).await;
    let products = storefront.visible_products();
    assert_eq!(storefront.category_label(products[0]), "Uncategorized");
}

#[tokio::test]
async fn test_cascade_delete_drops_loaded_products() {
    let app = TestApp::spawn_with(|config| {
        config.category_delete_policy = DeletePolicy::Cascade;
    })
    .await;
    let mut panel = logged_in_panel(&app).await;

    panel.select_tab(AdminTab::Products).await.expect("tab failed");
    let category = panel.categories()[0].id;
    panel.new_product();
    let editor = panel.product_editor_mut().expect("form open");
    editor.form.name = "Pie de limón".to_owned();
    editor.form.price = "6000".to_owned();
    editor.form.category_id = category.to_string();
    panel.submit_product_form().await.expect("create failed");

    panel.delete_category(category).await.expect("delete failed");
    assert!(panel.products().is_empty());
}

#[tokio::test]
async fn test_hiding_hero_reaches_storefront() {
    let app = TestApp::spawn().await;
    let mut panel = logged_in_panel(&app).await;

    panel.select_tab(AdminTab::Settings).await.expect("tab failed");
    assert!(panel.settings().hero_visible);

    panel.set_hero_visible(false).await.expect("update failed");
    assert!(!panel.settings().hero_visible);

    panel
        .update_setting(SettingKey::HeroTitle, "  Dulce Arte Repostería ")
        .await
        .expect("update failed");

    let storefront = Storefront::load(&app.client()).await;
    assert!(!storefront.hero_visible());
    assert_eq!(
        storefront.settings().hero_title.as_deref(),
        Some("Dulce Arte Repostería")
    );
}

#[tokio::test]
async fn test_rejected_session_returns_to_login() {
    let app = TestApp::spawn().await;
    let session = app.admin_session().await;

    // A server with another signing key rejects the token.
    let other = TestApp::spawn_with(|config| {
        config.jwt_secret = SecretString::from("another-signing-key-9f$Kq2!Lm7#Zx");
    })
    .await;
    let mut panel = AdminPanel::with_session(other.client(), session);
    panel.open_admin();
    assert_eq!(panel.view(), AdminView::Panel);

    assert!(matches!(
        panel.select_tab(AdminTab::Products).await,
        Err(PanelError::SessionExpired)
    ));
    assert!(panel.session().is_none());
    assert_eq!(panel.view(), AdminView::LoginForm);
    assert_eq!(panel.login_error(), Some(SESSION_EXPIRED));
    assert!(!panel.is_loaded(AdminTab::Products));

    // Logging in again on the same server recovers.
    panel.username = "admin".to_owned();
    panel.password = ADMIN_PASSWORD.to_owned();
    panel.submit_login().await.expect("login failed");
    assert_eq!(panel.view(), AdminView::Panel);
}

#[tokio::test]
async fn test_back_to_site_keeps_session_logout_clears() {
    let app = TestApp::spawn().await;
    let mut panel = logged_in_panel(&app).await;

    panel.back_to_site();
    assert_eq!(panel.view(), AdminView::LoggedOut);
    assert!(panel.session().is_some());

    panel.open_admin();
    assert_eq!(panel.view(), AdminView::Panel);

    panel.logout();
    assert!(panel.session().is_none());
    panel.open_admin();
    assert_eq!(panel.view(), AdminView::LoginForm);
}

#[tokio::test]
async fn test_login_succeeds_when_home_stats_fail() {
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use dulce_arte_core::{AdminUserId, AdminUserSummary, ApiMessage, Email, LoginResponse};

    // Accepts any login but cannot serve the dashboard.
    let api = Router::new()
        .route(
            "/api/auth/login",
            post(|| async {
                Json(LoginResponse {
                    token: "stub-token".to_owned(),
                    user: AdminUserSummary {
                        id: AdminUserId::new(1),
                        username: "admin".to_owned(),
                        email: Email::parse("admin@reposteria.com").expect("valid email"),
                        name: "Administrador".to_owned(),
                    },
                })
            }),
        )
        .route(
            "/api/dashboard/stats",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiMessage::new("Internal server error")),
                )
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    let server = tokio::spawn(async move {
        axum::serve(listener, api).await.expect("Server error");
    });

    let client = dulce_arte_storefront::ApiClient::new(&format!("http://{addr}"))
        .expect("Failed to create API client");
    let mut panel = AdminPanel::new(client);
    panel.open_admin();
    panel.username = "admin".to_owned();
    panel.password = ADMIN_PASSWORD.to_owned();

    panel.submit_login().await.expect("login should succeed");
    assert_eq!(panel.view(), AdminView::Panel);
    assert!(panel.session().is_some());
    assert!(panel.login_error().is_none());
    assert!(panel.stats().is_none());
    assert!(!panel.is_loaded(AdminTab::Home));
    assert_eq!(
        panel.notice(),
        Some(&Notice::Error("Internal server error".to_owned()))
    );

    server.abort();
}
