// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// Every variant carries a stable `code` string so clients can branch on the
/// failure kind without parsing messages.
#[derive(Debug)]
pub enum AppError {
    // 400 Bad Request (malformed or rejected input)
    Validation(String),

    // 401 Unauthorized (bad credentials)
    InvalidCredentials(&'static str, String),

    // 403 Forbidden (authenticated but not the owner, wrong role,
    // unapproved mentor, or bad registration secret)
    Forbidden(&'static str, String),

    // 404 Not Found (referenced entity absent; code is kind-specific)
    NotFound(&'static str, String),

    // 409 Conflict (uniqueness violation: duplicate email, duplicate
    // upvote, existing profile)
    Conflict(&'static str, String),

    // 500 Internal Server Error
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION",
            AppError::InvalidCredentials(code, _)
            | AppError::Forbidden(code, _)
            | AppError::NotFound(code, _)
            | AppError::Conflict(code, _) => code,
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into the `{success:false, message, code}` envelope
/// with the appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidCredentials(_, msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(_, msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(_, msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(_, msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        let body = Json(json!({
            "success": false,
            "message": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::Internal`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// True when a sqlx error is a unique-constraint violation (Postgres 23505).
/// Concurrent writers racing on a unique index must surface a conflict,
/// not an internal error.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
