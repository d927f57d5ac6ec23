//! Tenant-scope authorization.
//!
//! Directors and teachers may only touch resources under their own school.
//! A structurally valid token for school A is still rejected on school B's
//! resources. Handlers call [`assert_school_scope`] with the school id of
//! the resource being requested (from the path, body or an ownership
//! lookup).

use crate::{
    errors::{AppError, AppResult},
    middleware::auth_guard::AuthUser,
};

pub fn assert_school_scope(user: &AuthUser, requested_school_id: &str) -> AppResult<()> {
    match user.school_id.as_deref() {
        Some(own) if own == requested_school_id => Ok(()),
        _ => Err(AppError::Forbidden(
            "You can only access your own school data".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn director(school: Option<&str>) -> AuthUser {
        AuthUser {
            user_id:   "u1".into(),
            email:     "d@x.com".into(),
            role:      UserRole::SchoolDirector,
            school_id: school.map(str::to_owned),
        }
    }

    #[test]
    fn own_school_is_allowed() {
        assert!(assert_school_scope(&director(Some("school-a")), "school-a").is_ok());
    }

    #[test]
    fn other_school_is_forbidden() {
        assert!(matches!(
            assert_school_scope(&director(Some("school-a")), "school-b"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn token_without_school_is_forbidden_on_scoped_routes() {
        assert!(assert_school_scope(&director(None), "school-a").is_err());
    }
}
