//! Dulce Arte storefront library.
//!
//! Headless front end for the Dulce Arte API: an HTTP client, the public
//! catalog view model, the admin panel state machine and the contact form.
//! Rendering is left to whatever shell embeds these types.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod catalog;
pub mod client;
pub mod contact;
pub mod fallback;
pub mod session;

pub use admin::{AdminPanel, AdminTab, AdminView, PanelError};
pub use catalog::{CatalogSource, CategoryTab, Storefront};
pub use client::{ApiClient, ClientError, ImageFile};
pub use contact::ContactForm;
pub use session::AdminSession;
