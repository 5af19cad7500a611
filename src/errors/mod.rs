//! Error handling module for the university backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;

use crate::services::ReconciliationFailure;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const CONSTRAINT_VIOLATION: &str = "CONSTRAINT_VIOLATION";
    pub const RECONCILIATION_FAILED: &str = "RECONCILIATION_FAILED";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No row with that id, or the row belongs to another role
    #[error("{code}: {0}", code = codes::NOT_FOUND)]
    NotFound(String),
    /// A required argument (usually an entity id) was absent
    #[error("{code}: {0}", code = codes::INVALID_ARGUMENT)]
    InvalidArgument(String),
    /// Referential integrity or uniqueness rejected by the database
    #[error("{code}: {0}", code = codes::CONSTRAINT_VIOLATION)]
    ConstraintViolation(String),
    /// Some operations of a group reconciliation were rejected
    #[error("{code}: {0}", code = codes::RECONCILIATION_FAILED)]
    Reconciliation(ReconciliationFailure),
    /// Any other database error
    #[error("{code}: {0}", code = codes::DATABASE_ERROR)]
    Database(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::ConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::Reconciliation(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::InvalidArgument(_) => codes::INVALID_ARGUMENT,
            AppError::ConstraintViolation(_) => codes::CONSTRAINT_VIOLATION,
            AppError::Reconciliation(_) => codes::RECONCILIATION_FAILED,
            AppError::Database(_) => codes::DATABASE_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::InvalidArgument(msg)
            | AppError::ConstraintViolation(msg)
            | AppError::Database(msg) => msg.clone(),
            AppError::Reconciliation(failure) => failure.to_string(),
        }
    }

    /// Prefix a backend error with the operation (and entity id) that failed.
    pub fn context(self, operation: impl Display) -> Self {
        match self {
            AppError::Database(msg) => AppError::Database(format!("{operation}: {msg}")),
            AppError::ConstraintViolation(msg) => {
                AppError::ConstraintViolation(format!("{operation}: {msg}"))
            }
            other => other,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, AppError::ConstraintViolation(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.kind() {
                ErrorKind::ForeignKeyViolation
                | ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    tracing::warn!("Constraint violation: {}", db_err.message());
                    return AppError::ConstraintViolation(db_err.message().to_string());
                }
                _ => {}
            }
        }
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

/// Attaches the failing operation to a raw `sqlx` result.
pub trait DbResultExt<T> {
    fn with_context<F, D>(self, operation: F) -> Result<T, AppError>
    where
        F: FnOnce() -> D,
        D: Display;
}

impl<T> DbResultExt<T> for Result<T, sqlx::Error> {
    fn with_context<F, D>(self, operation: F) -> Result<T, AppError>
    where
        F: FnOnce() -> D,
        D: Display,
    {
        self.map_err(|err| AppError::from(err).context(operation()))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Reconciliation(failure) => serde_json::to_value(failure).ok(),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
