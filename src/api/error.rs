use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use super::types::{ErrorEnvelope, FieldError};

pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";
pub const TOKEN_NOT_VALID: &str = "token_not_valid";

#[derive(Debug)]
pub enum ApiError {
    /// Field and object-level failures, rendered in submission order.
    Validation(Vec<FieldError>),

    /// Rendered as `{"detail", "code"?}` instead of the error envelope.
    Unauthorized {
        detail: String,
        code: Option<&'static str>,
    },

    Forbidden(String),

    NotFound(String),

    Conflict(String),

    DatabaseError(String),

    ExternalApiError { service: String, message: String },

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(errors) => {
                let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
                write!(f, "Validation error: {}", messages.join("; "))
            }
            Self::Unauthorized { detail, .. } => write!(f, "Unauthorized: {detail}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ExternalApiError { service, message } => write!(f, "{service} error: {message}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct DetailBody {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            Self::Unauthorized { detail, code } => {
                return (StatusCode::UNAUTHORIZED, Json(DetailBody { detail, code })).into_response();
            }
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, errors),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, vec![FieldError::general(msg)]),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, vec![FieldError::general(msg)]),
            Self::Conflict(msg) => (StatusCode::CONFLICT, vec![FieldError::general(msg)]),
            Self::DatabaseError(msg) => {
                tracing::error!(event = "database_error", error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![FieldError::general("A database error occurred")],
                )
            }
            Self::ExternalApiError { service, message } => {
                tracing::warn!(event = "external_api_error", service = %service, error = %message);
                (
                    StatusCode::BAD_GATEWAY,
                    vec![FieldError::general(format!("{service} service is unavailable"))],
                )
            }
            Self::InternalError(msg) => {
                tracing::error!(event = "internal_error", error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![FieldError::general("An internal error occurred")],
                )
            }
        };

        (status, Json(ErrorEnvelope { errors })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn validation(location: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::at(location, message)])
    }

    pub fn not_found() -> Self {
        Self::NotFound("Not found.".to_string())
    }

    pub fn not_authenticated() -> Self {
        Self::Unauthorized {
            detail: NOT_AUTHENTICATED.to_string(),
            code: None,
        }
    }

    pub fn token_not_valid(detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            detail: detail.into(),
            code: Some(TOKEN_NOT_VALID),
        }
    }

    pub fn permission_denied() -> Self {
        Self::Forbidden(PERMISSION_DENIED.to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}
