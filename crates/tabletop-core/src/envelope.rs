//! JSON response envelope.
//!
//! Success: `{ "success": true, "data": …, "message": "…", "statusCode": 200 }`
//!
//! Error: `{ "success": false, "error": "CODE", "message": "…", "statusCode": 400 }`
//! with an optional `details` value.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Successful response carrying `data`.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data,
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessBody<'a, T> {
    success: bool,
    data: &'a T,
    message: &'a str,
    status_code: u16,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = SuccessBody {
            success: true,
            data: &self.data,
            message: &self.message,
            status_code: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Build an error envelope response.
pub fn error_response(
    status: StatusCode,
    error: &'static str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> Response {
    let body = ErrorBody {
        success: false,
        error,
        message: message.into(),
        status_code: status.as_u16(),
        details,
    };
    (status, Json(body)).into_response()
}
