use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::ClockError;

const LOG_TARGET: &str = "server::error";

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    AuthRequired,
    InvalidToken,
    Forbidden,
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message.clone())
            }
            ApiError::AuthRequired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authorization required".to_string(),
            ),
            ApiError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid token".to_string(),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "You are not staff at this venue".to_string(),
            ),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message.clone()),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERVER_ERROR",
                message.clone(),
            ),
        }
    }
}

impl From<ClockError> for ApiError {
    fn from(err: ClockError) -> Self {
        match err {
            ClockError::NotFound(_) => ApiError::NotFound("Tournament not found".to_string()),
            ClockError::InvalidTransition(reason) => ApiError::Validation(reason.to_string()),
            ClockError::Persistence(message) => {
                ApiError::internal(format!("Failed to perform clock action: {message}"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(target: LOG_TARGET, %message, "internal server error");
        }
        let body = json!({
            "success": false,
            "error": { "code": code, "message": message },
        });
        (status, Json(body)).into_response()
    }
}
