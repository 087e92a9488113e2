//! Admin panel state machine.
//!
//! ```text
//! LoggedOut --open_admin--> LoginForm --submit_login--> Panel(Home)
//!     ^                                                    |
//!     +------------- back_to_site / logout ----------------+
//! ```
//!
//! The panel owns the [`AdminSession`]. Any `401`/`403` from the API drops
//! it and returns to the login form. Other failures leave the loaded lists
//! untouched and set an inline notice. Nothing is retried.

use std::collections::HashSet;

use dulce_arte_core::{
    Category, CategoryForm, CategoryId, DashboardStats, DeletePolicy, Price, Product, ProductForm,
    ProductId, SettingKey, SiteSettings, ValidationErrors,
};
use thiserror::Error;

use crate::client::{ApiClient, ClientError, ImageFile};
use crate::session::AdminSession;

/// Shown on the login form after the API rejected the session.
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Top-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminView {
    /// The public site is showing.
    LoggedOut,
    LoginForm,
    Panel,
}

/// Panel tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AdminTab {
    /// Dashboard counters.
    #[default]
    Home,
    Products,
    Categories,
    Settings,
}

/// Inline message shown in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Why a panel action did not complete.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Local validation failed; nothing was sent.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The action needs a session and there is none.
    #[error("not logged in")]
    NotLoggedIn,

    /// No form of the needed kind is open.
    #[error("no form is open")]
    NoForm,

    /// Unknown product or category id.
    #[error("not found")]
    NotFound,

    /// The API rejected the session; it has been dropped.
    #[error("session expired")]
    SessionExpired,

    /// The API call failed.
    #[error(transparent)]
    Request(ClientError),
}

/// Whether an editor creates a new record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode<Id> {
    Create,
    Edit(Id),
}

/// Open product form.
#[derive(Debug, Clone)]
pub struct ProductEditor {
    pub mode: EditorMode<ProductId>,
    pub form: ProductForm,
    pub image: Option<ImageFile>,
    pub errors: ValidationErrors,
}

impl ProductEditor {
    /// Form validation plus the panel rule that a price must be positive.
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.form.validate() {
            Ok(_) => ValidationErrors::default(),
            Err(errors) => errors,
        };
        if errors.for_field("price").is_none()
            && Price::parse(&self.form.price).is_ok_and(|p| !p.is_positive())
        {
            errors.push("price", "Price must be greater than zero");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Open category form.
#[derive(Debug, Clone)]
pub struct CategoryEditor {
    pub mode: EditorMode<CategoryId>,
    pub form: CategoryForm,
    pub errors: ValidationErrors,
}

/// Admin panel state.
#[derive(Debug)]
pub struct AdminPanel {
    client: ApiClient,
    view: AdminView,
    session: Option<AdminSession>,
    tab: AdminTab,
    loaded: HashSet<AdminTab>,

    /// Login form fields.
    pub username: String,
    pub password: String,
    login_error: Option<String>,

    notice: Option<Notice>,
    stats: Option<DashboardStats>,
    products: Vec<Product>,
    categories: Vec<Category>,
    settings: SiteSettings,

    product_editor: Option<ProductEditor>,
    category_editor: Option<CategoryEditor>,
}

impl AdminPanel {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            view: AdminView::LoggedOut,
            session: None,
            tab: AdminTab::Home,
            loaded: HashSet::new(),
            username: String::new(),
            password: String::new(),
            login_error: None,
            notice: None,
            stats: None,
            products: Vec::new(),
            categories: Vec::new(),
            settings: SiteSettings::default(),
            product_editor: None,
            category_editor: None,
        }
    }

    /// Resume a session obtained earlier. The view stays on the site until
    /// [`AdminPanel::open_admin`].
    #[must_use]
    pub fn with_session(client: ApiClient, session: AdminSession) -> Self {
        let mut panel = Self::new(client);
        panel.session = Some(session);
        panel
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn view(&self) -> AdminView {
        self.view
    }

    #[must_use]
    pub const fn session(&self) -> Option<&AdminSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn active_tab(&self) -> AdminTab {
        self.tab
    }

    #[must_use]
    pub fn is_loaded(&self, tab: AdminTab) -> bool {
        self.loaded.contains(&tab)
    }

    #[must_use]
    pub fn login_error(&self) -> Option<&str> {
        self.login_error.as_deref()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    #[must_use]
    pub const fn stats(&self) -> Option<&DashboardStats> {
        self.stats.as_ref()
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub const fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    #[must_use]
    pub const fn product_editor(&self) -> Option<&ProductEditor> {
        self.product_editor.as_ref()
    }

    pub const fn product_editor_mut(&mut self) -> Option<&mut ProductEditor> {
        self.product_editor.as_mut()
    }

    #[must_use]
    pub const fn category_editor(&self) -> Option<&CategoryEditor> {
        self.category_editor.as_ref()
    }

    pub const fn category_editor_mut(&mut self) -> Option<&mut CategoryEditor> {
        self.category_editor.as_mut()
    }

    // =========================================================================
    // Navigation and session
    // =========================================================================

    /// The header's admin button: the panel if logged in, else the login form.
    pub fn open_admin(&mut self) {
        self.view = if self.session.is_some() {
            AdminView::Panel
        } else {
            AdminView::LoginForm
        };
    }

    /// Log in with the typed username and password.
    ///
    /// Empty fields fail without a request. On success the panel opens on the
    /// home tab and loads it. A failed home load is shown as an error notice
    /// and does not fail the login.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for empty fields and `Request` when the API
    /// rejects the credentials; both leave the login form showing.
    /// `SessionExpired` if the new token is rejected on the first load.
    pub async fn submit_login(&mut self) -> Result<(), PanelError> {
        let mut errors = ValidationErrors::default();
        if self.username.trim().is_empty() {
            errors.push("username", "Username is required");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        if !errors.is_empty() {
            self.login_error = Some(errors.to_string());
            return Err(PanelError::Validation(errors));
        }

        match self.client.login(self.username.trim(), &self.password).await {
            Ok(session) => {
                tracing::info!(admin = %session.user().username, "Admin logged in");
                self.session = Some(session);
                self.password.clear();
                self.login_error = None;
                self.notice = None;
                self.view = AdminView::Panel;
                self.tab = AdminTab::Home;
                self.loaded.clear();
                match self.load_active_tab().await {
                    Err(PanelError::SessionExpired) => Err(PanelError::SessionExpired),
                    _ => Ok(()),
                }
            }
            Err(e) => {
                self.login_error = Some(match &e {
                    ClientError::Unauthorized(_) => "Invalid username or password".to_owned(),
                    other => other.user_message(),
                });
                self.view = AdminView::LoginForm;
                Err(PanelError::Request(e))
            }
        }
    }

    /// Leave the panel; the session stays.
    pub fn back_to_site(&mut self) {
        self.view = AdminView::LoggedOut;
    }

    /// Drop the session and everything loaded with it.
    pub fn logout(&mut self) {
        self.clear_session();
        self.login_error = None;
        self.view = AdminView::LoggedOut;
    }

    fn clear_session(&mut self) {
        self.session = None;
        self.password.clear();
        self.tab = AdminTab::Home;
        self.loaded.clear();
        self.notice = None;
        self.stats = None;
        self.products.clear();
        self.categories.clear();
        self.settings = SiteSettings::default();
        self.product_editor = None;
        self.category_editor = None;
    }

    /// Switch tabs; the first visit loads the tab's data.
    ///
    /// # Errors
    ///
    /// See [`AdminPanel::load_active_tab`].
    pub async fn select_tab(&mut self, tab: AdminTab) -> Result<(), PanelError> {
        self.tab = tab;
        if self.loaded.contains(&tab) {
            return Ok(());
        }
        self.load_active_tab().await
    }

    /// (Re)load the active tab's data.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without a session, `SessionExpired` when the API
    /// rejects it, `Request` for other failures.
    pub async fn load_active_tab(&mut self) -> Result<(), PanelError> {
        let session = self.session.clone().ok_or(PanelError::NotLoggedIn)?;
        let client = self.client.clone();

        let result = match self.tab {
            AdminTab::Home => client
                .dashboard_stats(&session)
                .await
                .map(|stats| self.stats = Some(stats)),
            AdminTab::Products => {
                // The product form needs the category list for its select.
                match client.list_products(&session).await {
                    Ok(products) => client.list_categories(&session).await.map(|categories| {
                        self.products = products;
                        self.categories = categories;
                    }),
                    Err(e) => Err(e),
                }
            }
            AdminTab::Categories => client
                .list_categories(&session)
                .await
                .map(|categories| self.categories = categories),
            AdminTab::Settings => client
                .settings(&session)
                .await
                .map(|pairs| self.settings = SiteSettings::from_pairs(pairs)),
        };

        match result {
            Ok(()) => {
                self.loaded.insert(self.tab);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Record a failed call. Auth failures drop the session.
    fn fail(&mut self, error: ClientError) -> PanelError {
        if error.is_auth_failure() {
            tracing::info!("Admin session rejected, returning to login");
            self.clear_session();
            self.view = AdminView::LoginForm;
            self.login_error = Some(SESSION_EXPIRED.to_owned());
            return PanelError::SessionExpired;
        }
        tracing::warn!(error = %error, "Admin action failed");
        self.notice = Some(Notice::Error(error.user_message()));
        PanelError::Request(error)
    }

    fn require_session(&self) -> Result<AdminSession, PanelError> {
        self.session.clone().ok_or(PanelError::NotLoggedIn)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Open an empty product form.
    pub fn new_product(&mut self) {
        self.product_editor = Some(ProductEditor {
            mode: EditorMode::Create,
            form: ProductForm::default(),
            image: None,
            errors: ValidationErrors::default(),
        });
    }

    /// Open the product form prefilled from a loaded product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not in the loaded list.
    pub fn edit_product(&mut self, id: ProductId) -> Result<(), PanelError> {
        let product = self
            .products
            .iter()
            .find(|p| p.id == id)
            .ok_or(PanelError::NotFound)?;
        self.product_editor = Some(ProductEditor {
            mode: EditorMode::Edit(id),
            form: ProductForm::from_product(product),
            image: None,
            errors: ValidationErrors::default(),
        });
        Ok(())
    }

    pub fn cancel_product_form(&mut self) {
        self.product_editor = None;
    }

    /// Validate and send the open product form.
    ///
    /// # Errors
    ///
    /// Returns `Validation` (form stays open with its errors), `NoForm`,
    /// `SessionExpired` or `Request`.
    pub async fn submit_product_form(&mut self) -> Result<(), PanelError> {
        let editor = self.product_editor.as_mut().ok_or(PanelError::NoForm)?;
        if let Err(errors) = editor.validate() {
            editor.errors = errors.clone();
            return Err(PanelError::Validation(errors));
        }
        editor.errors = ValidationErrors::default();
        let editor = editor.clone();
        let session = self.require_session()?;

        let result = match editor.mode {
            EditorMode::Create => {
                self.client
                    .create_product(&session, &editor.form, editor.image.as_ref())
                    .await
            }
            EditorMode::Edit(id) => {
                self.client
                    .update_product(&session, id, &editor.form, editor.image.as_ref())
                    .await
            }
        };

        match result {
            Ok(product) => {
                let message = match editor.mode {
                    EditorMode::Create => "Product created",
                    EditorMode::Edit(_) => "Product updated",
                };
                match self.products.iter_mut().find(|p| p.id == product.id) {
                    Some(existing) => *existing = product,
                    None => self.products.insert(0, product),
                }
                self.product_editor = None;
                self.loaded.remove(&AdminTab::Home);
                self.notice = Some(Notice::Success(message.to_owned()));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// # Errors
    ///
    /// Returns `SessionExpired` or `Request`; the list is unchanged then.
    pub async fn delete_product(&mut self, id: ProductId) -> Result<(), PanelError> {
        let session = self.require_session()?;
        match self.client.delete_product(&session, id).await {
            Ok(_) => {
                self.products.retain(|p| p.id != id);
                self.loaded.remove(&AdminTab::Home);
                self.notice = Some(Notice::Success("Product deleted".to_owned()));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub fn new_category(&mut self) {
        self.category_editor = Some(CategoryEditor {
            mode: EditorMode::Create,
            form: CategoryForm::default(),
            errors: ValidationErrors::default(),
        });
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the category is not in the loaded list.
    pub fn edit_category(&mut self, id: CategoryId) -> Result<(), PanelError> {
        let category = self
            .categories
            .iter()
            .find(|c| c.id == id)
            .ok_or(PanelError::NotFound)?;
        self.category_editor = Some(CategoryEditor {
            mode: EditorMode::Edit(id),
            form: CategoryForm::from_category(category),
            errors: ValidationErrors::default(),
        });
        Ok(())
    }

    pub fn cancel_category_form(&mut self) {
        self.category_editor = None;
    }

    /// Validate and send the open category form.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `NoForm`, `SessionExpired` or `Request`.
    pub async fn submit_category_form(&mut self) -> Result<(), PanelError> {
        let editor = self.category_editor.as_mut().ok_or(PanelError::NoForm)?;
        if let Err(errors) = editor.form.validate() {
            editor.errors = errors.clone();
            return Err(PanelError::Validation(errors));
        }
        editor.errors = ValidationErrors::default();
        let editor = editor.clone();
        let session = self.require_session()?;

        let result = match editor.mode {
            EditorMode::Create => self.client.create_category(&session, &editor.form).await,
            EditorMode::Edit(id) => {
                self.client
                    .update_category(&session, id, &editor.form)
                    .await
            }
        };

        match result {
            Ok(category) => {
                // Keep product rows in step with a rename.
                for product in &mut self.products {
                    if product.category_id == Some(category.id) {
                        product.category_name = Some(category.name.clone());
                    }
                }
                match self.categories.iter_mut().find(|c| c.id == category.id) {
                    Some(existing) => *existing = category,
                    None => self.categories.push(category),
                }
                self.categories.sort_by(|a, b| a.name.cmp(&b.name));
                self.category_editor = None;
                self.loaded.remove(&AdminTab::Home);
                self.notice = Some(Notice::Success("Category saved".to_owned()));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Delete a category and apply the server's policy to the loaded products.
    ///
    /// # Errors
    ///
    /// Returns `SessionExpired` or `Request`; lists are unchanged then.
    pub async fn delete_category(&mut self, id: CategoryId) -> Result<(), PanelError> {
        let session = self.require_session()?;
        match self.client.delete_category(&session, id).await {
            Ok(deleted) => {
                self.categories.retain(|c| c.id != id);
                match deleted.policy {
                    DeletePolicy::SetNull => {
                        for product in &mut self.products {
                            if product.category_id == Some(id) {
                                product.category_id = None;
                                product.category_name = None;
                            }
                        }
                    }
                    DeletePolicy::Cascade => {
                        self.products.retain(|p| p.category_id != Some(id));
                    }
                }
                self.loaded.remove(&AdminTab::Home);
                self.notice = Some(Notice::Success(deleted.message));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Store one setting and mirror it locally.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a value the key does not accept, otherwise
    /// `SessionExpired` or `Request`.
    pub async fn update_setting(&mut self, key: SettingKey, value: &str) -> Result<(), PanelError> {
        let value = key.normalize(value).map_err(|e| {
            let mut errors = ValidationErrors::default();
            errors.push(key.as_str(), e.to_string());
            PanelError::Validation(errors)
        })?;
        let session = self.require_session()?;

        match self.client.update_setting(&session, key, &value).await {
            Ok(entry) => {
                if let Err(e) = self.settings.set(entry.key, &entry.value) {
                    tracing::warn!(error = %e, key = %entry.key, "Server returned an unusable setting");
                }
                self.notice = Some(Notice::Success("Settings updated".to_owned()));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Show or hide the hero section.
    ///
    /// # Errors
    ///
    /// See [`AdminPanel::update_setting`].
    pub async fn set_hero_visible(&mut self, visible: bool) -> Result<(), PanelError> {
        let value = if visible { "true" } else { "false" };
        self.update_setting(SettingKey::HeroVisible, value).await
    }
}
