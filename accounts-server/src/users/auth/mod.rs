pub mod middleware;

pub use middleware::{AuthenticatedUser, auth_middleware, require_staff};
