//! Dulce Arte Core - Shared types library.
//!
//! This crate provides the types shared by every Dulce Arte component:
//! - `api` - REST API serving the catalog, settings and admin routes
//! - `storefront` - Headless client: public catalog view and admin panel state machine
//! - `cli` - Command-line tools for migrations, seeding and admin management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, statuses and settings
//! - [`models`] - Wire models exchanged between the API and its clients

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
