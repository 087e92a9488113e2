//! Status enums for catalog entities.

use serde::{Deserialize, Serialize};

/// Product availability.
///
/// Older data used the Spanish labels `Disponible` / `Agotado`; both are
/// accepted as aliases when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Listed on the public catalog.
    #[default]
    #[serde(alias = "Disponible", alias = "disponible")]
    Available,
    /// Hidden from the public catalog.
    #[serde(alias = "Agotado", alias = "agotado")]
    SoldOut,
}

impl ProductStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 2] = [Self::Available, Self::SoldOut];

    /// Wire/database name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::SoldOut => "sold_out",
        }
    }

    /// Label shown to shoppers and admins.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Available => "Disponible",
            Self::SoldOut => "Agotado",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "available" | "Disponible" | "disponible" => Ok(Self::Available),
            "sold_out" | "Agotado" | "agotado" => Ok(Self::SoldOut),
            other => Err(format!("invalid product status: {other}")),
        }
    }
}

/// What happens to products when their category is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Products are kept and detached (`category_id = NULL`).
    #[default]
    SetNull,
    /// Products are deleted along with the category.
    Cascade,
}

impl std::fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetNull => write!(f, "set_null"),
            Self::Cascade => write!(f, "cascade"),
        }
    }
}

impl std::str::FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "set_null" | "setnull" | "nullify" => Ok(Self::SetNull),
            "cascade" => Ok(Self::Cascade),
            other => Err(format!("invalid category delete policy: {other}")),
        }
    }
}
