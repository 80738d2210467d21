//! Request payloads, their validation, and response bodies for the user
//! endpoints.
//!
//! Every request field is `Option` so that a missing key becomes a field
//! error instead of a deserialization failure. `validate` collects all
//! problems before returning, so a client sees every bad field at once.

use serde::{Deserialize, Serialize};

use accounts_core::User;
use accounts_core::domain::users::email::Email;
use accounts_core::domain::users::validation::{
    FieldErrors, MAX_NAME_CHARS, MIN_PASSWORD_CHARS, ValidationError,
};

/// Returned for any failed credential check, whatever the cause.
pub const AUTHENTICATION_FAILED: &str =
    "Unable to authenticate with provided credentials";

pub const DUPLICATE_EMAIL: &str = "user with this email already exists.";

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug)]
pub struct NewAccount {
    pub email: Email,
    pub password: String,
    pub name: String,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewAccount, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = validate_email(self.email.as_deref(), &mut errors);
        let password = required(self.password, "password", &mut errors)
            .and_then(|raw| validate_password(raw, &mut errors));
        let name = validate_name(self.name, &mut errors).unwrap_or_default();

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => Ok(NewAccount {
                email,
                password,
                name,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl TokenRequest {
    /// Presence checks only; the credential check itself happens against
    /// the store.
    pub fn validate(self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = required(self.email, "email", &mut errors);
        let password = required(self.password, "password", &mut errors);

        match (email, password) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(errors),
        }
    }
}

/// Body of `PATCH`/`PUT /api/user/me`. Email is not editable here.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub password: Option<String>,
}

impl UpdateMeRequest {
    /// `partial` is PATCH semantics: absent fields are left alone. A full
    /// update requires both fields.
    pub fn validate(self, partial: bool) -> Result<ProfileChanges, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = if partial {
            validate_name(self.name, &mut errors)
        } else {
            match self.name {
                Some(name) => validate_name(Some(name), &mut errors),
                None => {
                    errors.push(ValidationError::Required { field: "name" });
                    None
                }
            }
        };

        let password = match self.password {
            Some(raw) => validate_password(raw, &mut errors),
            None if partial => None,
            None => {
                errors.push(ValidationError::Required { field: "password" });
                None
            }
        };

        errors.into_result(ProfileChanges { name, password })
    }
}

/// Public representation of an account. Never carries secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

fn required(
    value: Option<String>,
    field: &'static str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match value {
        None => {
            errors.push(ValidationError::Required { field });
            None
        }
        Some(raw) if raw.trim().is_empty() => {
            errors.push(ValidationError::Blank { field });
            None
        }
        Some(raw) => Some(raw),
    }
}

fn validate_email(raw: Option<&str>, errors: &mut FieldErrors) -> Option<Email> {
    let raw = required(raw.map(str::to_string), "email", errors)?;
    match Email::parse(&raw) {
        Ok(email) => Some(email),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

fn validate_password(raw: String, errors: &mut FieldErrors) -> Option<String> {
    if raw.is_empty() {
        errors.push(ValidationError::Blank { field: "password" });
        return None;
    }
    if raw.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_CHARS,
        });
        return None;
    }
    Some(raw)
}

fn validate_name(raw: Option<String>, errors: &mut FieldErrors) -> Option<String> {
    let name = raw?;
    if name.chars().count() > MAX_NAME_CHARS {
        errors.push(ValidationError::TooLong {
            field: "name",
            max: MAX_NAME_CHARS,
        });
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(email: Option<&str>, password: Option<&str>, name: Option<&str>) -> CreateUserRequest {
        CreateUserRequest {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn valid_create_payload_normalizes_email() {
        let account = create(Some(" Test@Test.com "), Some("testpass"), Some("tester"))
            .validate()
            .unwrap();
        assert_eq!(account.email.as_str(), "test@test.com");
        assert_eq!(account.name, "tester");
    }

    #[test]
    fn name_is_optional() {
        let account = create(Some("a@b.com"), Some("testpass"), None).validate().unwrap();
        assert_eq!(account.name, "");
    }

    #[test]
    fn collects_every_bad_field() {
        let errors = create(None, Some("pw"), Some(&"x".repeat(256)))
            .validate()
            .unwrap_err();

        assert_eq!(errors.messages("email"), ["This field is required."]);
        assert_eq!(
            errors.messages("password"),
            ["Ensure this field has at least 5 characters."]
        );
        assert!(errors.contains("name"));
    }

    #[test]
    fn password_length_counts_characters() {
        // four characters, eight bytes
        let errors = create(Some("a@b.com"), Some("ééèè"), None).validate().unwrap_err();
        assert!(errors.contains("password"));
        assert!(create(Some("a@b.com"), Some("ééèèà"), None).validate().is_ok());
    }

    #[test]
    fn malformed_email_is_rejected() {
        for bad in ["plainaddress", "a@", "@b.com", "a b@c.com", "a@b@c.com"] {
            let errors = create(Some(bad), Some("testpass"), None).validate().unwrap_err();
            assert_eq!(errors.messages("email"), ["Enter a valid email address."], "{bad}");
        }
    }

    #[test]
    fn token_request_requires_both_fields() {
        let errors = TokenRequest {
            email: Some("test@test.com".into()),
            password: Some(String::new()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.messages("password"), ["This field may not be blank."]);
        assert!(!errors.contains("email"));

        let errors = TokenRequest::default().validate().unwrap_err();
        assert!(errors.contains("email") && errors.contains("password"));
    }

    #[test]
    fn partial_update_allows_missing_fields() {
        let changes = UpdateMeRequest {
            name: Some("new name".into()),
            password: None,
        }
        .validate(true)
        .unwrap();
        assert_eq!(changes.name.as_deref(), Some("new name"));
        assert!(changes.password.is_none());
    }

    #[test]
    fn full_update_requires_both_fields() {
        let errors = UpdateMeRequest::default().validate(false).unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("password"));
    }

    #[test]
    fn update_rejects_short_password() {
        let errors = UpdateMeRequest {
            name: None,
            password: Some("abc".into()),
        }
        .validate(true)
        .unwrap_err();
        assert!(errors.contains("password"));
    }

    #[test]
    fn response_has_no_password() {
        let body = serde_json::to_value(UserResponse {
            email: "a@b.com".into(),
            name: "A".into(),
        })
        .unwrap();
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        assert!(body.get("password").is_none());
    }
}
