//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and JSON error bodies so the
//! whole API fails the same way. Validation and authorization failures are
//! client errors; booking conflicts map to 409 so callers can re-fetch and
//! retry; everything else is a server error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dutyroster_core::errors::DutyError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping.
///
/// Wraps domain-specific [`DutyError`] instances and implements
/// `IntoResponse` to convert them into HTTP responses with appropriate
/// status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub DutyError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map error types to HTTP status codes
        let status = match &self.0 {
            DutyError::NotFound(_) => StatusCode::NOT_FOUND,
            DutyError::Validation(_) => StatusCode::BAD_REQUEST,
            DutyError::Authentication(_) => StatusCode::UNAUTHORIZED,
            DutyError::Authorization(_) => StatusCode::FORBIDDEN,
            DutyError::Conflict(_) => StatusCode::CONFLICT,
            DutyError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DutyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Get the error message and format as JSON
        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        // Combine status code and JSON body into a response
        (status, body).into_response()
    }
}

/// Allows using `?` with functions returning `Result<T, DutyError>` in
/// handlers that return `Result<T, AppError>`.
impl From<DutyError> for AppError {
    fn from(err: DutyError) -> Self {
        AppError(err)
    }
}

/// Wraps repository-level eyre errors in the Database variant.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(DutyError::Database(err))
    }
}
