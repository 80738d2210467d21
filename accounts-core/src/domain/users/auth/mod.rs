pub mod crypto;
pub mod service;
pub mod token;

pub use crypto::{AuthCrypto, AuthCryptoError};
pub use service::AuthenticationService;
pub use token::{AuthToken, AuthTokenError};
