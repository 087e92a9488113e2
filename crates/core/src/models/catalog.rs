//! Categories and products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationErrors;
use crate::types::{CategoryId, DeletePolicy, Price, ProductId, ProductStatus};

/// Maximum category name length.
pub const CATEGORY_NAME_MAX: usize = 100;
/// Maximum product name length.
pub const PRODUCT_NAME_MAX: usize = 200;
/// Maximum description length for categories and products.
pub const DESCRIPTION_MAX: usize = 2000;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product as returned by the API, with its category name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// `None` once the category was deleted under [`DeletePolicy::SetNull`].
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub status: ProductStatus,
    /// Relative URL such as `/uploads/product-<uuid>.jpg`.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product shows up in the public catalog.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }
}

/// Validated category fields ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// Validated product fields ready to be stored.
///
/// The image is handled separately by the upload path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: CategoryId,
    pub status: ProductStatus,
}

/// Category form as typed by an admin; also the JSON body of the category
/// create/update routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CategoryForm {
    /// Prefill from an existing category.
    #[must_use]
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
        }
    }

    /// Check required fields and lengths.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<NewCategory, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = required_text(&mut errors, "name", &self.name, CATEGORY_NAME_MAX);
        let description = optional_text(&mut errors, "description", &self.description);

        match name {
            Some(name) if errors.is_empty() => Ok(NewCategory { name, description }),
            _ => Err(errors),
        }
    }
}

/// Product form as typed by an admin; also the text fields of the product
/// multipart routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub status: String,
}

impl ProductForm {
    /// Prefill from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            status: product.status.as_str().to_owned(),
        }
    }

    /// Check required fields: name, price and category. A missing status
    /// means [`ProductStatus::Available`].
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = required_text(&mut errors, "name", &self.name, PRODUCT_NAME_MAX);
        let description = optional_text(&mut errors, "description", &self.description);

        let price = if self.price.trim().is_empty() {
            errors.push("price", "Price is required");
            None
        } else {
            match Price::parse(&self.price) {
                Ok(price) => Some(price),
                Err(e) => {
                    errors.push("price", e.to_string());
                    None
                }
            }
        };

        let category_id = if self.category_id.trim().is_empty() {
            errors.push("category_id", "Category is required");
            None
        } else if let Ok(id) = self.category_id.parse::<CategoryId>() {
            Some(id)
        } else {
            errors.push("category_id", "Category is invalid");
            None
        };

        let status = if self.status.trim().is_empty() {
            Some(ProductStatus::default())
        } else if let Ok(status) = self.status.parse::<ProductStatus>() {
            Some(status)
        } else {
            errors.push("status", "Status must be available or sold_out");
            None
        };

        match (name, price, category_id, status) {
            (Some(name), Some(price), Some(category_id), Some(status)) if errors.is_empty() => {
                Ok(NewProduct {
                    name,
                    description,
                    price,
                    category_id,
                    status,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    raw: &str,
    max: usize,
) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        errors.push(field, "Name is required");
        return None;
    }
    if value.chars().count() > max {
        errors.push(field, format!("Name must be at most {max} characters"));
        return None;
    }
    Some(value.to_owned())
}

fn optional_text(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.chars().count() > DESCRIPTION_MAX {
        errors.push(
            field,
            format!("Description must be at most {DESCRIPTION_MAX} characters"),
        );
        return None;
    }
    (!value.is_empty()).then(|| value.to_owned())
}

/// Response of `DELETE /api/categories/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDeleted {
    pub message: String,
    pub policy: DeletePolicy,
    /// Products detached or deleted along with the category.
    pub affected_products: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: "Torta de chocolate".to_owned(),
            description: "  Tres capas  ".to_owned(),
            price: "45000".to_owned(),
            category_id: "1".to_owned(),
            status: String::new(),
        }
    }

    #[test]
    fn test_product_form_valid() {
        let product = form().validate().unwrap();
        assert_eq!(product.name, "Torta de chocolate");
        assert_eq!(product.description.as_deref(), Some("Tres capas"));
        assert_eq!(product.price, Price::parse("45000").unwrap());
        assert_eq!(product.category_id, CategoryId::new(1));
        assert_eq!(product.status, ProductStatus::Available);
    }

    #[test]
    fn test_product_form_reports_every_missing_field() {
        let errors = ProductForm::default().validate().unwrap_err();
        assert!(errors.for_field("name").is_some());
        assert!(errors.for_field("price").is_some());
        assert!(errors.for_field("category_id").is_some());
        assert!(errors.for_field("status").is_none());
    }

    #[test]
    fn test_product_form_rejects_negative_price_and_bad_status() {
        let mut f = form();
        f.price = "-5".to_owned();
        f.status = "archived".to_owned();
        let errors = f.validate().unwrap_err();
        assert_eq!(errors.for_field("price"), Some("price cannot be negative"));
        assert!(errors.for_field("status").is_some());
    }

    #[test]
    fn test_category_form() {
        let ok = CategoryForm {
            name: " Tortas ".to_owned(),
            description: String::new(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.name, "Tortas");
        assert_eq!(ok.description, None);

        let err = CategoryForm::default().validate().unwrap_err();
        assert_eq!(err.for_field("name"), Some("Name is required"));
    }

    #[test]
    fn test_category_name_too_long() {
        let err = CategoryForm {
            name: "a".repeat(CATEGORY_NAME_MAX + 1),
            description: String::new(),
        }
        .validate()
        .unwrap_err();
        assert!(err.for_field("name").is_some());
    }
}
