//! Public storefront view model.
//!
//! [`Storefront::load`] reads the catalog once; everything after that is
//! local state (selected tab, open product) and display helpers.

use dulce_arte_core::{Category, CategoryId, Product, ProductId, SiteSettings};

use crate::client::ApiClient;
use crate::fallback;

/// Image shown for products without one.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-product.jpg";

/// Label for products whose category was deleted.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Label of the tab that shows every product.
pub const ALL_TAB_LABEL: &str = "All";

/// Where the displayed catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Api,
    /// Built-in catalog; the API could not be reached.
    Fallback,
}

/// A category filter tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryTab {
    #[default]
    All,
    Category(CategoryId),
}

/// Storefront state after the initial load.
#[derive(Debug, Clone)]
pub struct Storefront {
    categories: Vec<Category>,
    products: Vec<Product>,
    settings: SiteSettings,
    source: CatalogSource,
    asset_base: Option<url::Url>,
    tab: CategoryTab,
    selected: Option<ProductId>,
}

impl Storefront {
    /// Fetch categories, products and settings.
    ///
    /// Never fails: if the catalog cannot be fetched the built-in fallback is
    /// shown, and if only the settings fail the defaults are used.
    pub async fn load(client: &ApiClient) -> Self {
        let categories = client.public_categories().await;
        let products = client.public_products(None).await;
        let settings = client.public_settings().await;

        let settings = match settings {
            Ok(pairs) => SiteSettings::from_pairs(pairs),
            Err(e) => {
                tracing::warn!(error = %e, "Settings unavailable, using defaults");
                SiteSettings::default()
            }
        };

        let (categories, products, source) = match (categories, products) {
            (Ok(categories), Ok(products)) => (categories, products, CatalogSource::Api),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Catalog unavailable, showing fallback");
                (
                    fallback::categories(),
                    fallback::products(),
                    CatalogSource::Fallback,
                )
            }
        };

        let mut storefront = Self::from_parts(categories, products, settings, source);
        storefront.asset_base = Some(client.base_url().clone());
        storefront
    }

    /// Build from already-fetched data.
    #[must_use]
    pub fn from_parts(
        categories: Vec<Category>,
        products: Vec<Product>,
        settings: SiteSettings,
        source: CatalogSource,
    ) -> Self {
        Self {
            categories,
            products,
            settings,
            source,
            asset_base: None,
            tab: CategoryTab::All,
            selected: None,
        }
    }

    #[must_use]
    pub const fn source(&self) -> CatalogSource {
        self.source
    }

    #[must_use]
    pub const fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// `All` followed by one tab per category.
    #[must_use]
    pub fn tabs(&self) -> Vec<(CategoryTab, &str)> {
        std::iter::once((CategoryTab::All, ALL_TAB_LABEL))
            .chain(
                self.categories
                    .iter()
                    .map(|c| (CategoryTab::Category(c.id), c.name.as_str())),
            )
            .collect()
    }

    #[must_use]
    pub const fn active_tab(&self) -> CategoryTab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: CategoryTab) {
        self.tab = tab;
    }

    /// Products of the active tab.
    #[must_use]
    pub fn visible_products(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| match self.tab {
                CategoryTab::All => true,
                CategoryTab::Category(id) => p.category_id == Some(id),
            })
            .collect()
    }

    /// Open the detail view of a product. Unknown ids close it.
    pub fn select_product(&mut self, id: ProductId) -> Option<&Product> {
        self.selected = self.products.iter().any(|p| p.id == id).then_some(id);
        self.selected_product()
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    #[must_use]
    pub fn selected_product(&self) -> Option<&Product> {
        let id = self.selected?;
        self.products.iter().find(|p| p.id == id)
    }

    /// Category name, or [`UNCATEGORIZED`] for detached products.
    #[must_use]
    pub fn category_label<'a>(&'a self, product: &'a Product) -> &'a str {
        product
            .category_name
            .as_deref()
            .or_else(|| {
                let id = product.category_id?;
                self.categories
                    .iter()
                    .find(|c| c.id == id)
                    .map(|c| c.name.as_str())
            })
            .unwrap_or(UNCATEGORIZED)
    }

    /// Price as shown on cards: `$25,000` or `$12.50`.
    #[must_use]
    pub fn price_label(product: &Product) -> String {
        product.price.display_label()
    }

    /// Absolute image URL, or the placeholder.
    #[must_use]
    pub fn image_url(&self, product: &Product) -> String {
        let Some(path) = product.image_url.as_deref().filter(|p| !p.is_empty()) else {
            return PLACEHOLDER_IMAGE.to_owned();
        };
        match &self.asset_base {
            Some(base) => base
                .join(path.trim_start_matches('/'))
                .map_or_else(|_| path.to_owned(), |url| url.to_string()),
            None => path.to_owned(),
        }
    }

    #[must_use]
    pub const fn hero_visible(&self) -> bool {
        self.settings.hero_visible
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dulce_arte_core::{Price, ProductStatus};

    fn category(id: i32, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_owned(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(id: i32, category: Option<(i32, &str)>, image: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Producto {id}"),
            description: None,
            price: Price::parse("25000").unwrap(),
            category_id: category.map(|(id, _)| CategoryId::new(id)),
            category_name: category.map(|(_, name)| name.to_owned()),
            status: ProductStatus::Available,
            image_url: image.map(str::to_owned),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn storefront() -> Storefront {
        Storefront::from_parts(
            vec![category(1, "Cupcakes"), category(2, "Tortas")],
            vec![
                product(1, Some((2, "Tortas")), Some("/uploads/product-a.png")),
                product(2, Some((1, "Cupcakes")), None),
                product(3, Some((2, "Tortas")), None),
                product(4, None, None),
            ],
            SiteSettings::default(),
            CatalogSource::Api,
        )
    }

    #[test]
    fn test_tabs_start_with_all() {
        let sf = storefront();
        let labels: Vec<&str> = sf.tabs().into_iter().map(|(_, label)| label).collect();
        assert_eq!(labels, vec!["All", "Cupcakes", "Tortas"]);
        assert_eq!(sf.active_tab(), CategoryTab::All);
    }

    #[test]
    fn test_category_filter() {
        let mut sf = storefront();
        assert_eq!(sf.visible_products().len(), 4);

        sf.select_tab(CategoryTab::Category(CategoryId::new(2)));
        let ids: Vec<i32> = sf.visible_products().iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3]);

        sf.select_tab(CategoryTab::All);
        assert_eq!(sf.visible_products().len(), 4);
    }

    #[test]
    fn test_detail_view() {
        let mut sf = storefront();
        assert_eq!(sf.select_product(ProductId::new(2)).unwrap().name, "Producto 2");
        assert!(sf.select_product(ProductId::new(99)).is_none());
        assert!(sf.selected_product().is_none());

        sf.select_product(ProductId::new(1));
        sf.close_detail();
        assert!(sf.selected_product().is_none());
    }

    #[test]
    fn test_display_helpers() {
        let sf = storefront();
        let detached = &sf.products[3];
        assert_eq!(sf.category_label(detached), UNCATEGORIZED);
        assert_eq!(sf.category_label(&sf.products[0]), "Tortas");
        assert_eq!(Storefront::price_label(detached), "$25,000");
        assert_eq!(sf.image_url(detached), PLACEHOLDER_IMAGE);
        assert_eq!(sf.image_url(&sf.products[0]), "/uploads/product-a.png");
        assert!(sf.hero_visible());
    }

    #[test]
    fn test_image_url_keeps_api_prefix() {
        let mut sf = storefront();
        sf.asset_base = Some(url::Url::parse("https://dulcearte.com/backend/").unwrap());
        assert_eq!(
            sf.image_url(&sf.products[0]),
            "https://dulcearte.com/backend/uploads/product-a.png"
        );
        assert_eq!(sf.image_url(&sf.products[3]), PLACEHOLDER_IMAGE);
    }

    #[tokio::test]
    async fn test_load_falls_back_when_api_is_down() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let sf = Storefront::load(&client).await;
        assert_eq!(sf.source(), CatalogSource::Fallback);
        assert!(!sf.visible_products().is_empty());
        assert_eq!(sf.settings(), &SiteSettings::default());
    }
}
