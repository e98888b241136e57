pub mod article;
pub mod user;

use std::collections::HashMap;

pub use article::{Article, CreateArticleForm, UpdateArticleForm};
pub use user::{CreateUserForm, LoginForm, UpdateUserForm, User};

/// Per-field messages, keyed by field name.
pub type FieldErrors = HashMap<String, String>;

/// Checks a request form before any store or cache call is made.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// Collects field errors; the first failure per field wins.
#[derive(Debug, Default)]
pub struct FieldValidator {
    errors: FieldErrors,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, "This field is required".to_string());
        }
        self
    }

    /// Length in characters, inclusive bounds.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        if len < min || len > max {
            self.fail(field, format!("Must be between {} and {} characters", min, max));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        let valid = match value.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
            None => false,
        };
        if !valid {
            self.fail(field, "Must be a valid email address".to_string());
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    fn fail(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_insert(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_per_field_is_kept() {
        let errors = FieldValidator::new()
            .required("title", "")
            .length("title", "", 3, 100)
            .finish()
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors["title"], "This field is required");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(FieldValidator::new().length("title", "日本語", 3, 3).finish().is_ok());
        assert!(FieldValidator::new().length("title", "ab", 3, 100).finish().is_err());
    }

    #[test]
    fn email_shape() {
        assert!(FieldValidator::new().email("email", "ada@example.com").finish().is_ok());
        for bad in ["ada", "@example.com", "ada@example", "ada@.com"] {
            assert!(FieldValidator::new().email("email", bad).finish().is_err(), "{bad}");
        }
    }
}
