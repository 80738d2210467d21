use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::{MAX_EMAIL_CHARS, ValidationError};

/// Email value object used as the account identity.
///
/// The whole address is trimmed and lower-cased, so `Test@EXAMPLE.com` and
/// `test@example.com` name the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Normalize and validate an address.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let email = Self::normalize(raw.as_ref());

        if email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }

        if email.chars().count() > MAX_EMAIL_CHARS {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_CHARS,
            });
        }

        if email.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidEmail);
        }

        let (local, domain) =
            email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(ValidationError::InvalidEmail);
        }

        // No empty labels: rejects "a@.com", "a@b..com" and "a@b."
        if domain.split('.').any(str::is_empty) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Self(email))
    }

    /// Lookup form of an address without validating it.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_entire_address() {
        let email = Email::parse("  Test@EXAMPLE.COM ").unwrap();
        assert_eq!(email.as_str(), "test@example.com");
    }

    #[test]
    fn empty_or_blank_is_missing() {
        assert_eq!(Email::parse(""), Err(ValidationError::MissingEmail));
        assert_eq!(Email::parse("   "), Err(ValidationError::MissingEmail));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in [
            "plainaddress",
            "@example.com",
            "user@",
            "a@b@c.com",
            "user@.com",
            "user@example..com",
            "us er@example.com",
        ] {
            assert_eq!(
                Email::parse(raw),
                Err(ValidationError::InvalidEmail),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_single_label_domains() {
        assert!(Email::parse("root@localhost").is_ok());
    }

    #[test]
    fn enforces_length_limit() {
        let raw = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(raw),
            Err(ValidationError::TooLong { field: "email", .. })
        ));
    }
}
