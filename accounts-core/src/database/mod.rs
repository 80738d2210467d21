#[cfg(feature = "database")]
pub mod context;
pub mod infrastructure;
pub mod ports;
pub mod readiness;

#[cfg(feature = "database")]
pub use context::DatabaseContext;
#[cfg(feature = "database")]
pub use infrastructure::postgres::PostgresDatabase;
