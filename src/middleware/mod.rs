pub mod auth_guard;
pub mod role_guard;
pub mod school_scope;
