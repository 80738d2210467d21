//! Configuration for the accounts service.
//!
//! Values are layered: process environment (after an optional `.env`) over an
//! optional TOML file over built-in defaults. [`ConfigLoader`] produces the
//! typed [`Config`] together with non-fatal [`ConfigWarnings`]; malformed
//! values are hard [`ConfigLoadError`]s.

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError};
pub use models::{
    AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig,
    DbWaitConfig, ServerConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};
