use std::sync::OnceLock;

use regex::Regex;

use super::types::FieldError;
use crate::domain::Choice;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex pattern defined in code")
    })
}

#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value)
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Invalid regex pattern defined in code"))
}

/// Letters, digits and `@ . + - _` only.
#[must_use]
pub fn is_valid_username(value: &str) -> bool {
    username_regex().is_match(value)
}

/// Field errors collected in request-field order.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, location: &str, message: impl Into<String>) {
        self.errors.push(FieldError::at(location, message));
    }

    #[must_use]
    pub fn has(&self, location: &str) -> bool {
        self.errors
            .iter()
            .any(|e| e.location.as_deref() == Some(location))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Trimmed non-empty value, or a "required" error at `location`.
    pub fn required<'a>(&mut self, location: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Some(v),
            None => {
                self.push(location, REQUIRED);
                None
            }
        }
    }

    pub fn required_value<T>(&mut self, location: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(location, REQUIRED);
        }
        value
    }

    /// Parses an optional choice code; an unknown code is an error at `location`.
    pub fn choice<C: Choice>(&mut self, location: &str, value: Option<&str>) -> Option<C> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        let parsed = C::parse(value);
        if parsed.is_none() {
            self.push(location, format!("\"{value}\" is not a valid choice."));
        }
        parsed
    }

    /// Parses an optional integer filter.
    pub fn integer(&mut self, location: &str, value: Option<&str>) -> Option<i32> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        let parsed = value.parse().ok();
        if parsed.is_none() {
            self.push(location, "A valid integer is required.");
        }
        parsed
    }

    /// Like [`Self::choice`] but a missing value is also an error.
    pub fn required_choice<C: Choice>(&mut self, location: &str, value: Option<&str>) -> Option<C> {
        let value = self.required(location, value)?;
        self.choice(location, Some(value))
    }

    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<FieldError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnimeStatus;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("test@gmail.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("test"));
        assert!(!is_valid_email("test@localhost"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn username_shapes() {
        assert!(is_valid_username("haruhi"));
        assert!(is_valid_username("kei.s@mail+x_-1"));
        assert!(is_valid_username("ユーザー"));
        assert!(!is_valid_username("../../x"));
        assert!(!is_valid_username("a b"));
        assert!(!is_valid_username("a/b"));
    }

    #[test]
    fn required_and_choice_keep_order() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.required("username", Some("  ")), None);
        assert_eq!(errors.required("email", Some(" a@b.co ")), Some("a@b.co"));
        let status: Option<AnimeStatus> = errors.choice("status", Some("SOON"));
        assert!(status.is_none());
        let none: Option<AnimeStatus> = errors.choice("season", None);
        assert!(none.is_none());

        let errors = errors.into_inner();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], FieldError::at("username", REQUIRED));
        assert_eq!(
            errors[1],
            FieldError::at("status", "\"SOON\" is not a valid choice.")
        );
    }
}
