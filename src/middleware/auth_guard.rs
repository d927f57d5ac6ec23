//! Authentication guard middleware.
//!
//! Reads the `Authorization: Bearer` header, verifies the token's signature
//! and expiry, and injects an `AuthUser` extension into the request for
//! downstream handlers. Identity is rebuilt from the token on every request;
//! there is no server-side session.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{
    errors::{AppError, AppResult},
    models::UserRole,
    state::AppState,
};

/// Authenticated caller extracted from a valid token. Injected into request
/// extensions by `require_auth`; downstream handlers use `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id:   String,
    pub email:     String,
    pub role:      UserRole,
    pub school_id: Option<String>,
}

pub fn bearer_token(req: &Request) -> AppResult<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}

/// Middleware: require a valid bearer token.
/// On success, inserts `AuthUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?.to_owned();
    let claims = state.jwt.verify(&token)?;

    req.extensions_mut().insert(AuthUser {
        user_id:   claims.sub,
        email:     claims.email,
        role:      claims.role,
        school_id: claims.school_id,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/students");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let req = request_with_auth(None);
        assert!(matches!(bearer_token(&req), Err(AppError::Unauthorized)));
    }

    #[test]
    fn non_bearer_scheme_is_unauthorized() {
        let req = request_with_auth(Some("Basic dXNlcjpwdw=="));
        assert!(matches!(bearer_token(&req), Err(AppError::Unauthorized)));
    }

    #[test]
    fn empty_bearer_is_unauthorized() {
        let req = request_with_auth(Some("Bearer "));
        assert!(matches!(bearer_token(&req), Err(AppError::Unauthorized)));
    }

    #[test]
    fn bearer_token_is_extracted() {
        let req = request_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&req).unwrap(), "abc.def.ghi");
    }
}
