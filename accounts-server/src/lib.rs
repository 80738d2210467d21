//! # Accounts Server
//!
//! HTTP API over the accounts core:
//!
//! - `POST /api/user/create` registers an account
//! - `POST /api/user/token` exchanges email and password for a bearer token
//! - `GET`/`PATCH`/`PUT /api/user/me` read and edit the caller's profile
//! - `/admin/core/user/...` lists and edits accounts for staff
//!
//! The binary in `main.rs` adds the CLI (`serve`, `db wait`, `db migrate`,
//! `create-superuser`).

pub mod admin;
pub mod infra;
pub mod routes;
pub mod users;

pub use infra::app_state::AppState;
