use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::pipeline::finalizer::FinalizeError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Model failures are carried unchanged from the client.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Format violation: {0}")]
    Format(#[from] FinalizeError),

    #[error("Token count mismatch: expected {expected} rows, model emitted {actual}")]
    TokenCount { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The language model call failed".to_string(),
                )
            }
            AppError::Format(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "FORMAT_VIOLATION",
                e.to_string(),
            ),
            AppError::TokenCount { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "TOKEN_COUNT_MISMATCH",
                self.to_string(),
            ),
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Json(e) => (StatusCode::BAD_REQUEST, "JSON_ERROR", e.to_string()),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
