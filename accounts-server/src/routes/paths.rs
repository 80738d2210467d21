//! Route paths, shared by the router and the integration tests.

pub const HEALTH: &str = "/health";

pub mod user {
    pub const CREATE: &str = "/api/user/create";
    pub const TOKEN: &str = "/api/user/token";
    pub const ME: &str = "/api/user/me";
}

pub mod admin {
    use uuid::Uuid;

    pub const USER_CHANGELIST: &str = "/admin/core/user/";
    pub const USER_CHANGE: &str = "/admin/core/user/{id}/change/";

    pub fn user_change(id: Uuid) -> String {
        USER_CHANGE.replace("{id}", &id.to_string())
    }
}
