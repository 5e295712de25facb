// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::pace::PaceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Pace(#[from] PaceError),

    #[error("Invalid payload: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Strava API error (status {status:?}): {body}")]
    Upstream { status: Option<u16>, body: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Upstream failure carrying a transport error (no HTTP status).
    pub fn transport(err: reqwest::Error) -> Self {
        AppError::Upstream {
            status: None,
            body: err.to_string(),
        }
    }

    /// HTTP status of the upstream response, if this error came from one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AppError::Upstream { status, .. } => *status,
            _ => None,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Pace(err) => {
                let code = match err {
                    PaceError::Format(_) => "format_error",
                    PaceError::Range(_) => "range_error",
                    PaceError::Division(_) => "division_error",
                };
                (StatusCode::BAD_REQUEST, code, Some(err.to_string()))
            }
            AppError::Validation(errs) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                Some(errs.to_string()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "auth_error", Some(msg.clone()))
            }
            AppError::Upstream { status, body } => {
                tracing::warn!(upstream_status = ?status, body = %body, "Strava API error");
                (StatusCode::BAD_GATEWAY, "upstream_error", Some(body.clone()))
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            upstream_status: self.upstream_status(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
