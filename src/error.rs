// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Google OAuth endpoint unreachable or answered non-2xx.
    #[error("Google provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Contacts API failure during an operation whose errors must propagate.
    #[error("Upstream error from {endpoint}: HTTP {status}")]
    UpstreamError { endpoint: String, status: u16 },

    /// No usable Google token could be obtained for this user.
    #[error("No Google token available for user {0}")]
    GoogleTokenNotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for the "no credential record" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::GoogleTokenNotFound(_))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::ProviderUnavailable(msg) => {
                tracing::error!(error = %msg, "Google provider unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "provider_unavailable",
                    Some(msg.clone()),
                )
            }
            AppError::UpstreamError { endpoint, status } => {
                tracing::error!(endpoint = %endpoint, status, "Contacts API error");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    Some(format!("{} returned HTTP {}", endpoint, status)),
                )
            }
            AppError::GoogleTokenNotFound(user_uuid) => (
                StatusCode::NOT_FOUND,
                "google_token_not_found",
                Some(format!("No Google token for user {}", user_uuid)),
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
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
