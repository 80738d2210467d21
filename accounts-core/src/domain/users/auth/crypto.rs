//! Credential hashing and token sealing.
//!
//! Passwords go through Argon2id with a server-side pepper appended to the
//! plaintext. Bearer tokens are looked up by an HMAC-SHA-256 digest and kept
//! recoverable only as AES-256-GCM ciphertext, so a repeated login can hand
//! back the token the user already holds.

use std::fmt;

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use hmac::{Hmac, Mac};
use password_hash::{Error as PasswordHashError, Salt};
use rand::{TryRngCore, rngs::OsRng};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 12;
const SEAL_KEY_LABEL: &[u8] = b"accounts/token-seal/v1";

#[derive(Debug, Error)]
pub enum AuthCryptoError {
    #[error("password pepper must not be empty")]
    EmptyPasswordPepper,
    #[error("token HMAC key must not be empty")]
    EmptyTokenKey,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidArgon2Params(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("token sealing error: {0}")]
    TokenSeal(&'static str),
}

impl From<PasswordHashError> for AuthCryptoError {
    fn from(err: PasswordHashError) -> Self {
        AuthCryptoError::PasswordHash(err.to_string())
    }
}

/// Keys derived from the configured token secret.
#[derive(Clone)]
struct TokenKeys {
    digest: HmacSha256,
    seal: Aes256Gcm,
}

impl TokenKeys {
    fn derive(secret: &[u8]) -> Result<Self, AuthCryptoError> {
        if secret.is_empty() {
            return Err(AuthCryptoError::EmptyTokenKey);
        }
        let digest = <HmacSha256 as Mac>::new_from_slice(secret)
            .map_err(|_| AuthCryptoError::EmptyTokenKey)?;

        // Sealing key = HMAC(secret, label)
        let mut kdf = digest.clone();
        kdf.update(SEAL_KEY_LABEL);
        let mut okm = Zeroizing::new([0u8; 32]);
        okm.copy_from_slice(&kdf.finalize().into_bytes());
        let seal = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(okm.as_slice()));

        Ok(Self { digest, seal })
    }
}

/// Hashing and sealing primitives for credentials.
pub struct AuthCrypto {
    argon2: Argon2<'static>,
    pepper: Zeroizing<Vec<u8>>,
    tokens: TokenKeys,
}

impl fmt::Debug for AuthCrypto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCrypto")
            .field("argon2_params", self.argon2.params())
            .finish_non_exhaustive()
    }
}

impl AuthCrypto {
    /// Production Argon2id cost: 64 MiB, 3 passes, one lane.
    fn default_params() -> Result<Params, AuthCryptoError> {
        ParamsBuilder::new()
            .m_cost(64 * 1024)
            .t_cost(3)
            .p_cost(1)
            .output_len(32)
            .build()
            .map_err(|err| AuthCryptoError::InvalidArgon2Params(err.to_string()))
    }

    pub fn new(
        password_pepper: impl AsRef<[u8]>,
        token_key: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        Self::with_params(password_pepper, token_key, Self::default_params()?)
    }

    /// Same as [`new`](Self::new) with explicit Argon2 cost, e.g. a cheap one
    /// for tests.
    pub fn with_params(
        password_pepper: impl AsRef<[u8]>,
        token_key: impl AsRef<[u8]>,
        params: Params,
    ) -> Result<Self, AuthCryptoError> {
        let pepper = password_pepper.as_ref();
        if pepper.is_empty() {
            return Err(AuthCryptoError::EmptyPasswordPepper);
        }

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            pepper: Zeroizing::new(pepper.to_vec()),
            tokens: TokenKeys::derive(token_key.as_ref())?,
        })
    }

    fn peppered(&self, password: &str) -> Zeroizing<Vec<u8>> {
        Zeroizing::new([password.as_bytes(), self.pepper.as_slice()].concat())
    }

    /// PHC string for a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AuthCryptoError> {
        let mut salt = [0u8; Salt::RECOMMENDED_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|err| AuthCryptoError::PasswordHash(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt)?;

        Ok(self
            .argon2
            .hash_password(&self.peppered(password), &salt)?
            .to_string())
    }

    /// Errors only when `password_hash` is not a PHC string.
    pub fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthCryptoError> {
        let parsed = PasswordHash::new(password_hash)?;
        Ok(self
            .argon2
            .verify_password(&self.peppered(password), &parsed)
            .is_ok())
    }

    /// Lookup digest of a bearer token, 64 hex chars.
    pub fn hash_token(&self, token: &str) -> String {
        let mut mac = self.tokens.digest.clone();
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Encrypt a token for storage as hex `nonce || ciphertext`.
    pub fn seal_token(&self, token: &str) -> Result<String, AuthCryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|_| AuthCryptoError::TokenSeal("nonce generation failed"))?;

        let ciphertext = self
            .tokens
            .seal
            .encrypt(Nonce::from_slice(&nonce), token.as_bytes())
            .map_err(|_| AuthCryptoError::TokenSeal("encryption failed"))?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    /// Inverse of [`seal_token`](Self::seal_token). Fails for tampered input
    /// or a value sealed under another key.
    pub fn open_token(&self, sealed: &str) -> Result<String, AuthCryptoError> {
        let raw = hex::decode(sealed).map_err(|_| AuthCryptoError::TokenSeal("not hex"))?;
        if raw.len() <= NONCE_LEN {
            return Err(AuthCryptoError::TokenSeal("truncated"));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);

        let plaintext = self
            .tokens
            .seal
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AuthCryptoError::TokenSeal("decryption failed"))?;
        String::from_utf8(plaintext).map_err(|_| AuthCryptoError::TokenSeal("not utf-8"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap(pepper: &str, key: &str) -> AuthCrypto {
        AuthCrypto::with_params(pepper, key, Params::new(8, 1, 1, Some(32)).unwrap()).unwrap()
    }

    #[test]
    fn password_round_trip_respects_pepper() {
        let crypto = cheap("pepper", "token-key");
        let hash = crypto.hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(crypto.verify_password("correct horse", &hash).unwrap());
        assert!(!crypto.verify_password("battery staple", &hash).unwrap());
        assert!(!cheap("other", "token-key").verify_password("correct horse", &hash).unwrap());
    }

    #[test]
    fn token_digest_is_stable_hex() {
        let crypto = cheap("pepper", "token-key");
        let digest = crypto.hash_token("opaque-token");

        assert_eq!(digest.len(), 64);
        assert_eq!(digest, crypto.hash_token("opaque-token"));
        assert_ne!(digest, cheap("pepper", "other-key").hash_token("opaque-token"));
    }

    #[test]
    fn sealed_token_opens_only_under_the_same_key() {
        let crypto = cheap("pepper", "token-key");
        let sealed = crypto.seal_token("0123456789abcdef").unwrap();

        assert_ne!(sealed, crypto.seal_token("0123456789abcdef").unwrap());
        assert_eq!(crypto.open_token(&sealed).unwrap(), "0123456789abcdef");
        assert!(cheap("pepper", "other-key").open_token(&sealed).is_err());
    }

    #[test]
    fn tampered_or_short_seal_is_rejected() {
        let crypto = cheap("pepper", "token-key");
        let mut sealed = crypto.seal_token("secret").unwrap();
        let last = if sealed.ends_with('0') { "1" } else { "0" };
        sealed.replace_range(sealed.len() - 1.., last);

        assert!(crypto.open_token(&sealed).is_err());
        assert!(crypto.open_token("abcd").is_err());
        assert!(crypto.open_token("zz").is_err());
    }

    #[test]
    fn empty_secrets_are_refused() {
        assert!(matches!(
            AuthCrypto::new("", "token"),
            Err(AuthCryptoError::EmptyPasswordPepper)
        ));
        assert!(matches!(
            AuthCrypto::new("pepper", ""),
            Err(AuthCryptoError::EmptyTokenKey)
        ));
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(cheap("p", "k").verify_password("x", "not-a-phc-string").is_err());
    }
}
