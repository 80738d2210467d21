use chrono::{DateTime, Utc};
use rand::{TryRngCore, rngs::OsRng};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthTokenError {
    #[error("Token generation failed")]
    GenerationFailed,
    #[error("Stored token is malformed")]
    Malformed,
}

/// Opaque bearer token handed to a client after a successful credential check.
///
/// 160 bits of OS randomness rendered as 40 lowercase hex characters. Only its
/// HMAC digest is persisted; the plaintext exists once, in the response.
#[derive(Clone)]
pub struct AuthToken {
    value: String,
    created_at: DateTime<Utc>,
}

impl AuthToken {
    const BYTES: usize = 20;
    pub const ENCODED_LEN: usize = Self::BYTES * 2;

    pub fn generate() -> Result<Self, AuthTokenError> {
        let mut bytes = [0u8; Self::BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| AuthTokenError::GenerationFailed)?;

        Ok(Self {
            value: hex::encode(bytes),
            created_at: Utc::now(),
        })
    }

    /// Rebuild a token recovered from storage.
    pub fn restore(value: String, created_at: DateTime<Utc>) -> Result<Self, AuthTokenError> {
        if !Self::is_well_formed(&value) {
            return Err(AuthTokenError::Malformed);
        }
        Ok(Self { value, created_at })
    }

    /// Cheap shape check before any storage lookup.
    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == Self::ENCODED_LEN
            && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"[redacted]")
            .field("created_at", &self.created_at)
            .finish()
    }
}
