//! # Accounts Core
//!
//! Core library for the accounts service: the user record, its manager, the
//! credential and token primitives, and the storage ports with their
//! PostgreSQL and in-memory adapters.
//!
//! ## Overview
//!
//! - **Users**: email-keyed accounts created only through [`UserManager`],
//!   which normalizes the email and hashes the password
//! - **Authentication**: credential checks and opaque bearer tokens bound 1:1
//!   to a user, persisted only as HMAC digests
//! - **Storage**: repository ports ([`database::ports`]) with PostgreSQL
//!   (feature `database`) and in-memory adapters
//! - **Readiness**: a retrying wait for the database to accept queries
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use accounts_core::{
//!     AuthCrypto, UserManager,
//!     application::unit_of_work::AppUnitOfWork,
//!     domain::users::user::ExtraFields,
//! };
//!
//! async fn register() -> Result<(), Box<dyn std::error::Error>> {
//!     let uow = AppUnitOfWork::in_memory();
//!     let crypto = Arc::new(AuthCrypto::new("pepper", "token-key")?);
//!     let manager = UserManager::new(uow.users.clone(), crypto);
//!
//!     let user = manager
//!         .create_user("Alice@Example.COM", Some("hunter22"), ExtraFields::named("Alice"))
//!         .await?;
//!     assert_eq!(user.email, "alice@example.com");
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Error types shared by the domain, services and adapters
pub mod error;

/// User and authentication domain
pub mod domain;

/// Storage ports, adapters and readiness probing
pub mod database;

/// Composition of repository ports used by application services
pub mod application;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use domain::users::auth::{
    AuthCrypto, AuthCryptoError, AuthToken, AuthenticationService,
};
pub use domain::users::manager::UserManager;
pub use domain::users::user::User;
pub use error::{AccountError, Result};
