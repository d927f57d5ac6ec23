//! Role-based authorization guard.
//!
//! Runs after `require_auth`: the allow-list check never sees a request
//! whose token failed verification.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::middleware::auth_guard::AuthUser;
use crate::models::UserRole;

/// Middleware: require the `school_director` role.
pub async fn require_director(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if user.role != UserRole::SchoolDirector {
        return Err(AppError::forbidden());
    }
    Ok(next.run(req).await)
}
