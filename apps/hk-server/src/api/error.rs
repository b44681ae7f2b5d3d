use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use hk_app::AppError;
use serde::Serialize;
use tracing::error;

/// Error response: `{"status": "error", "message": ...}`.
#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Body could not be parsed.
    BadRequest(String),
    /// Parsed, but the config cannot be built into a topology.
    Unprocessable(String),
    Internal(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        if err.is_config_error() {
            ApiError::Unprocessable(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        let body = Json(ErrorResponse {
            status: "error",
            message,
        });
        (status, body).into_response()
    }
}
