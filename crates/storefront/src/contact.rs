//! Contact form.
//!
//! Validates locally and acknowledges the visitor. Nothing is sent anywhere.

use dulce_arte_core::{Email, ValidationErrors};

/// Acknowledgement shown after a valid submission.
pub const THANK_YOU: &str = "Thank you for your message! We will get back to you soon.";

/// Longest accepted message.
const MESSAGE_MAX: usize = 2000;

/// Contact form fields as typed by the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// A validated contact submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: Email,
    pub message: String,
}

impl ContactForm {
    /// Check required fields and the email address.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<ContactSubmission, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("name", "Name is required");
        }

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(_) if self.email.trim().is_empty() => {
                errors.push("email", "Email is required");
                None
            }
            Err(_) => {
                errors.push("email", "Please enter a valid email address");
                None
            }
        };

        let message = self.message.trim();
        if message.is_empty() {
            errors.push("message", "Message is required");
        } else if message.chars().count() > MESSAGE_MAX {
            errors.push(
                "message",
                format!("Message must be at most {MESSAGE_MAX} characters"),
            );
        }

        match email {
            Some(email) if errors.is_empty() => Ok(ContactSubmission {
                name: name.to_owned(),
                email,
                message: message.to_owned(),
            }),
            _ => Err(errors),
        }
    }

    /// Validate, clear the form and return the thank-you notice.
    ///
    /// On failure the form keeps what the visitor typed.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn submit(&mut self) -> Result<&'static str, ValidationErrors> {
        let submission = self.validate()?;
        tracing::info!(email = %submission.email, "Contact form submitted");
        *self = Self::default();
        Ok(THANK_YOU)
    }
}
