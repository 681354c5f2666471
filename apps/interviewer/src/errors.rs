use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::interview::parser::ParseError;
use crate::llm_client::LlmError;
use crate::session::SessionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed model response: {0}")]
    MalformedResponse(#[from] ParseError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidTransition { .. } => AppError::InvalidTransition(err.to_string()),
            SessionError::Extraction(e) => AppError::Extraction(e),
            SessionError::Llm(e) => AppError::Llm(e),
            SessionError::Parse(e) => AppError::MalformedResponse(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidTransition(msg) => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION", msg.clone())
            }
            AppError::Extraction(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                format!("{e}. Please upload another file."),
            ),
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                match e {
                    LlmError::Quota { .. } => (
                        StatusCode::TOO_MANY_REQUESTS,
                        "LLM_QUOTA",
                        "The AI service rejected the API key or the quota is exhausted"
                            .to_string(),
                    ),
                    LlmError::Transient(_) => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "LLM_UNAVAILABLE",
                        "The AI service is unavailable, please try again".to_string(),
                    ),
                    LlmError::EmptyResponse(_) | LlmError::Rejected { .. } => (
                        StatusCode::BAD_GATEWAY,
                        "LLM_ERROR",
                        "The AI service returned no usable answer".to_string(),
                    ),
                }
            }
            AppError::MalformedResponse(e) => {
                tracing::error!("Malformed model response: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_RESPONSE",
                    format!("The AI answer could not be read ({e}). Please try again."),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
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
