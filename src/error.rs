//! Structured error types for API responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    SelfParent,

    // Not found errors
    EmployeeNotFound,
    TaskNotFound,

    // Conflict errors
    AlreadyExists,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    fn status(&self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::SelfParent => StatusCode::BAD_REQUEST,
            ErrorCode::EmployeeNotFound | ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error for API responses.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn self_parent(task_id: i64) -> Self {
        Self::new(
            ErrorCode::SelfParent,
            format!("Task {} cannot be its own parent", task_id),
        )
        .with_field("parent_task_id")
    }

    pub fn employee_not_found(employee_id: i64) -> Self {
        Self::new(
            ErrorCode::EmployeeNotFound,
            format!("Employee not found: {}", employee_id),
        )
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {}", task_id))
    }

    pub fn already_exists(what: &str) -> Self {
        Self::new(ErrorCode::AlreadyExists, format!("{} already exists", what))
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to ApiError first
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => ApiError::database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self.message);
        }
        (status, Json(self)).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::task_not_found(7).code.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::self_parent(1).code.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::database("boom").code.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn anyhow_downcast_preserves_code() {
        let err: anyhow::Error = ApiError::employee_not_found(3).into();
        let back: ApiError = err.into();
        assert_eq!(back.code, ErrorCode::EmployeeNotFound);
    }
}
