//! Request extractors whose rejections stay inside the error envelope.
//!
//! axum's own `Json` and `Query` answer malformed input with their default
//! plain-text responses before the handler runs. These wrappers convert the
//! rejection into `AppError::BadRequest`, so a missing field, a malformed
//! body or an unknown enum value reaches the client as 400 with the same
//! `{ success: false, error }` body as every other failure.

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request as HttpRequest},
    };
    use serde::Deserialize;

    use crate::models::StudentStatus;

    #[derive(Deserialize)]
    struct Payload {
        name:   String,
        status: Option<StudentStatus>,
    }

    fn json_request(body: &str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/students")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_body_passes_through() {
        let req = json_request(r#"{"name": "Awa"}"#);
        let Json(payload) = Json::<Payload>::from_request(req, &()).await.unwrap();
        assert_eq!(payload.name, "Awa");
    }

    #[tokio::test]
    async fn missing_required_field_is_bad_request() {
        let req = json_request(r#"{"status": "active"}"#);
        assert!(matches!(
            Json::<Payload>::from_request(req, &()).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn unknown_enum_value_is_bad_request() {
        let req = json_request(r#"{"name": "Awa", "status": "enrolled"}"#);
        assert!(matches!(
            Json::<Payload>::from_request(req, &()).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let req = json_request("{not json");
        assert!(matches!(
            Json::<Payload>::from_request(req, &()).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn missing_content_type_is_bad_request() {
        let req = HttpRequest::builder()
            .method("POST")
            .uri("/students")
            .body(Body::from(r#"{"name": "Awa"}"#))
            .unwrap();
        assert!(matches!(
            Json::<Payload>::from_request(req, &()).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn unparseable_query_is_bad_request() {
        #[derive(Deserialize)]
        struct Params {
            count: i64,
        }

        let (mut parts, _) = HttpRequest::builder()
            .uri("/students?count=many")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        assert!(matches!(
            Query::<Params>::from_request_parts(&mut parts, &()).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn valid_query_passes_through() {
        #[derive(Deserialize)]
        struct Params {
            count: i64,
        }

        let (mut parts, _) = HttpRequest::builder()
            .uri("/students?count=3")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let Query(params) = Query::<Params>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(params.count, 3);
    }
}
