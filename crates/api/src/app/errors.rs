use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use pawmart_core::DomainError;
use pawmart_infra::StoreError;

/// Body of every 401 response.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized Access";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    InvalidId(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": UNAUTHORIZED_MESSAGE })),
            )
                .into_response(),
            ApiError::InvalidId(e) => json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
            ApiError::Store(e) => {
                error!(error = %e, "storage operation failed");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_error",
                    "storage operation failed",
                )
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
