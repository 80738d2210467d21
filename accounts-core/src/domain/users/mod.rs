pub mod auth;
pub mod email;
pub mod manager;
pub mod user;
pub mod validation;
