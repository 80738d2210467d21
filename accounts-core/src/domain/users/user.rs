//! User account record
//!
//! ## Lifecycle
//!
//! 1. **Creation**: only through [`UserManager`](super::manager::UserManager),
//!    which normalizes the email and hashes the password
//! 2. **Authentication**: email + password are checked and an opaque token is
//!    issued, stamping `last_login`
//! 3. **Profile updates**: the owner may change `name` and password; staff may
//!    change `name` and the authorization flags
//!
//! ## Security
//!
//! The password hash is kept out of this type entirely (it lives in the
//! credentials store), so serializing a `User` can never leak it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Normalized (lower-case) unique email address
    pub email: String,
    /// Display name, empty when not provided
    pub name: String,
    /// Inactive accounts cannot authenticate
    pub is_active: bool,
    /// Grants access to the admin endpoints
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Timestamp of the most recent token issuance
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional attributes passed through [`UserManager::create_user`] unchanged.
///
/// [`UserManager::create_user`]: super::manager::UserManager::create_user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFields {
    pub name: Option<String>,
    /// Defaults to `true` when unset
    pub is_active: Option<bool>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl ExtraFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Partial change to an existing user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.is_active.is_none()
            && self.is_staff.is_none()
            && self.is_superuser.is_none()
    }

    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(active) = self.is_active {
            user.is_active = active;
        }
        if let Some(staff) = self.is_staff {
            user.is_staff = staff;
        }
        if let Some(superuser) = self.is_superuser {
            user.is_superuser = superuser;
        }
    }
}

/// Search criteria for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring matched against email or name
    pub search: Option<String>,
}

impl UserFilter {
    /// Trimmed, lower-cased search term; `None` when blank.
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, user: &User) -> bool {
        match self.needle() {
            None => true,
            Some(needle) => {
                user.email.contains(&needle)
                    || user.name.to_lowercase().contains(&needle)
            }
        }
    }

    /// SQL `LIKE` pattern for a literal substring match, to be used with
    /// `ESCAPE '\'`.
    pub fn like_pattern(&self) -> Option<String> {
        self.needle().map(|needle| {
            let mut pattern = String::with_capacity(needle.len() + 2);
            pattern.push('%');
            for ch in needle.chars() {
                if matches!(ch, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(ch);
            }
            pattern.push('%');
            pattern
        })
    }
}
