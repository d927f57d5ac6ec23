//! Uniform JSON response envelope: `{ success, data?, message? }`.
//!
//! Error responses carry `{ success: false, error }` and are produced by
//! `AppError::into_response` in `errors.rs`.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 200 with data.
pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    Json(ApiResponse { success: true, data: Some(data), message: None })
}

/// 200 with data and a human-readable message.
pub fn ok_with_message<T: Serialize>(data: T, message: &str) -> impl IntoResponse {
    Json(ApiResponse { success: true, data: Some(data), message: Some(message.to_owned()) })
}

/// 201 with the created resource.
pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(ApiResponse { success: true, data: Some(data), message: None }),
    )
}

/// 200 with only a message (e.g. after a delete).
pub fn message(message: &str) -> impl IntoResponse {
    Json(ApiResponse::<()> { success: true, data: None, message: Some(message.to_owned()) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_skips_absent_fields() {
        let body = ApiResponse { success: true, data: Some(5), message: None };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 5 }));
    }

    #[test]
    fn envelope_carries_message() {
        let body = ApiResponse::<()> {
            success: true,
            data: None,
            message: Some("Student deleted".into()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "Student deleted" }));
    }
}
