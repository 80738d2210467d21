pub mod auth_tokens;
pub mod users;

pub use auth_tokens::PostgresAuthTokenRepository;
pub use users::PostgresUsersRepository;
