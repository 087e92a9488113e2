//! Built-in catalog shown when the API cannot be reached.

use chrono::{DateTime, Utc};

use dulce_arte_core::{Category, CategoryId, Price, Product, ProductId, ProductStatus};

/// `(name, description)` of the fallback categories.
const CATEGORIES: [(&str, &str); 4] = [
    ("Tortas", "Tortas para toda ocasión"),
    ("Cupcakes", "Cupcakes decorados artesanalmente"),
    ("Galletas", "Galletas caseras y decoradas"),
    ("Postres", "Postres individuales y para compartir"),
];

/// `(name, description, price in cents, index into CATEGORIES)`.
const PRODUCTS: [(&str, &str, i64, usize); 5] = [
    (
        "Torta de Chocolate",
        "Bizcocho de chocolate con ganache y frutos rojos",
        4_500_000,
        0,
    ),
    (
        "Torta Tres Leches",
        "Clásica torta húmeda con merengue",
        3_800_000,
        0,
    ),
    (
        "Cupcakes de Vainilla",
        "Caja de seis con buttercream",
        1_800_000,
        1,
    ),
    (
        "Galletas Decoradas",
        "Docena de galletas de mantequilla con glaseado",
        1_500_000,
        2,
    ),
    ("Brownie", "Brownie de chocolate con nueces", 600_000, 3),
];

/// Fallback categories, ordered by name like the API returns them.
#[must_use]
pub fn categories() -> Vec<Category> {
    let now = epoch();
    let mut categories: Vec<Category> = CATEGORIES
        .iter()
        .zip(1..)
        .map(|(&(name, description), id)| Category {
            id: CategoryId::new(id),
            name: name.to_owned(),
            description: Some(description.to_owned()),
            created_at: now,
            updated_at: now,
        })
        .collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    categories
}

/// Fallback products, all available and without images.
#[must_use]
pub fn products() -> Vec<Product> {
    let now = epoch();
    PRODUCTS
        .iter()
        .zip(1..)
        .filter_map(|(&(name, description, cents, category), id)| {
            let (category_name, _) = CATEGORIES.get(category)?;
            let category_id = i32::try_from(category + 1).ok()?;
            Some(Product {
                id: ProductId::new(id),
                name: name.to_owned(),
                description: Some(description.to_owned()),
                price: Price::from_cents(cents).ok()?,
                category_id: Some(CategoryId::new(category_id)),
                category_name: Some((*category_name).to_owned()),
                status: ProductStatus::Available,
                image_url: None,
                created_at: now,
                updated_at: now,
            })
        })
        .collect()
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}
