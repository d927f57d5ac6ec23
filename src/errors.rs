//! Application error taxonomy.
//!
//! Every handler returns `AppResult<T>`; the `IntoResponse` impl converts a
//! failure into the uniform `{ success: false, error: ... }` JSON envelope.
//! Internal details are logged server-side and never leak to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not authenticated")]
    Unauthorized,

    /// Same message for unknown email and wrong password, so responses do
    /// not reveal which accounts exist.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("Resource not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    /// The database could not be reached or the pool is exhausted.
    /// Kept distinct from query-execution errors.
    #[error("Service temporarily unavailable")]
    Unavailable,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn forbidden() -> Self {
        AppError::Forbidden("You do not have permission to access this resource".into())
    }

    /// Driver-error mapping for write statements: integrity violations
    /// (SQLSTATE 23000, duplicate key or broken foreign-key reference)
    /// become `Conflict`; everything else goes through the generic `From`.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some("23000") {
                return AppError::Conflict("Duplicate value or unknown reference".into());
            }
        }
        AppError::from(err)
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)  => StatusCode::BAD_REQUEST,
            AppError::Unauthorized   => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_)   => StatusCode::FORBIDDEN,
            AppError::NotFound       => StatusCode::NOT_FOUND,
            AppError::Conflict(_)    => StatusCode::CONFLICT,
            AppError::Unavailable    => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_)    => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                tracing::error!(error = ?err, "Database unavailable");
                AppError::Unavailable
            }
            other => AppError::Internal(anyhow::anyhow!(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Internal server error");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };
        let body = Json(serde_json::json!({
            "success": false,
            "error":   message,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_map_to_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::Unavailable));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn row_errors_stay_internal() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden().status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }
}
