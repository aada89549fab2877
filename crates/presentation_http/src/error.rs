//! API error handling
//!
//! Maps application errors onto HTTP responses. Every upstream fault is
//! reported as 503 Service Unavailable with a stable, client-facing message;
//! the underlying cause travels in the `details` field.

use application::ApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Stable client-facing message
        message: String,
        /// Underlying cause
        details: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            Self::ServiceUnavailable { message, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                message,
                Some(details),
            ),
            Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
                Some(msg),
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::UpstreamUnavailable(details) => Self::ServiceUnavailable {
                message: "The data source server is unavailable currently.".to_string(),
                details,
            },
            ApplicationError::UpstreamBadResponse(details) => Self::ServiceUnavailable {
                message: "Bad data source server response code.".to_string(),
                details,
            },
            ApplicationError::MalformedPayload(details) => Self::ServiceUnavailable {
                message: "Bad data source server response.".to_string(),
                details,
            },
            ApplicationError::Transport(details) => Self::ServiceUnavailable {
                message: "Cannot read data source server response.".to_string(),
                details,
            },
            ApplicationError::Cancelled => Self::Internal("request was cancelled".to_string()),
            ApplicationError::Configuration(msg) | ApplicationError::Internal(msg) => {
                Self::Internal(msg)
            },
        }
    }
}
