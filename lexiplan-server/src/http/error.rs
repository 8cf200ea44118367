//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes:
//! `{ "success": false, "error": ..., "message": ..., "details"?: [...] }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Duplicate or still-referenced row (409)
    Conflict { message: String },

    /// Database unreachable after retries (503, logged)
    Unavailable(DbError),

    /// Database error (500, logged)
    Database(DbError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(e) => json!({
                "success": false,
                "error": "validation_error",
                "message": e.to_string(),
                "details": [{ "field": e.field(), "message": e.to_string() }]
            }),
            Self::NotFound { resource, id } => json!({
                "success": false,
                "error": "not_found",
                "message": format!("{} '{}' not found", resource, id)
            }),
            Self::Conflict { message } => json!({
                "success": false,
                "error": "conflict",
                "message": message
            }),
            Self::Unavailable(e) => {
                tracing::warn!(error = %e, "database unavailable");
                json!({
                    "success": false,
                    "error": "service_unavailable",
                    "message": "the database is temporarily unavailable, try again later"
                })
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, sql_state = ?e.sql_state(), "Database error");
                json!({
                    "success": false,
                    "error": "internal_error",
                    "message": "an internal error occurred"
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { message } => Self::Conflict { message },
            DbError::Shutdown => Self::Unavailable(e),
            e if e.is_transient() => Self::Unavailable(e),
            e => Self::Database(e),
        }
    }
}
