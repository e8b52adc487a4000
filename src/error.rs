// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Caller is authenticated but does not own the resource.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A write-once relation (stance) already exists.
    #[error("Already set: {0}")]
    AlreadySet(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Auth provider error: {0}")]
    AuthProvider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::Unauthorized(_) => (StatusCode::FORBIDDEN, "unauthorized"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            AppError::AlreadySet(_) => (StatusCode::CONFLICT, "already_set"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::AuthProvider(_) => (StatusCode::BAD_GATEWAY, "auth_provider_error"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();
        let details = match &self {
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidArgument(msg)
            | AppError::AlreadySet(msg)
            | AppError::Conflict(msg) => Some(msg.clone()),
            AppError::InvalidToken => None,
            AppError::AuthProvider(msg) => {
                tracing::error!(error = %msg, "Auth provider error");
                None
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
