//! Core types for Dulce Arte.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod settings;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use settings::{SettingKey, SettingsError, SiteSettings};
pub use status::*;
