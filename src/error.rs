//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Authentication Errors**: bad credentials, duplicate registration,
///   missing/unknown session token
/// - **Validation Errors**: amounts out of bounds, malformed QR payloads,
///   invalid request data; always raised before any state mutation
/// - **Business Logic Errors**: insufficient balance for a payment
/// - **Backend Errors**: failures in the storage layer, split into
///   retryable and terminal (see [`BackendError`])
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Sign-in email/password pair did not match any account.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Email or password is incorrect")]
    InvalidCredentials,

    /// Registration attempted with an email that already has an account.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Email is already in use")]
    EmailAlreadyInUse,

    /// Requested amount is zero, negative, or outside flow-specific bounds.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String describes which bound was violated.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Account balance cannot cover the requested payment.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    /// Raised before any mutation, so balance and history are unchanged.
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// A scanned QR payload failed to parse or is not a payment request.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid payment request payload: {0}")]
    InvalidPayload(String),

    /// Session token is missing, unknown, or has been logged out.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid or expired session")]
    InvalidSession,

    /// Requested account does not exist in the backend store.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Account not found")]
    AccountNotFound,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Storage-layer failure from whichever backend adapter is active.
    ///
    /// Retryable failures return HTTP 503, terminal ones HTTP 500; the
    /// client-facing message never exposes backend internals.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Failure in the storage layer beneath the wallet operations.
///
/// Transient I/O trouble is distinguished from corrupt state so callers
/// (and clients, via the status code) can tell "try again" from "operator
/// attention needed".
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Local persistence file could not be read or written. Retryable.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed (connection, query, transaction). Retryable.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Persisted state exists but cannot be decoded. Terminal.
    #[error("corrupt persisted state: {0}")]
    Corrupt(String),
}

impl BackendError {
    /// Whether the caller can reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Io(_) | BackendError::Database(_) => true,
            BackendError::Corrupt(_) => false,
        }
    }
}

// Database errors always arrive wrapped in the backend taxonomy.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        AppError::Backend(BackendError::Database(error))
    }
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidCredentials`, `InvalidSession` → 401 Unauthorized
/// - `EmailAlreadyInUse` → 409 Conflict
/// - `InvalidAmount`, `InvalidPayload`, `InvalidRequest` → 400 Bad Request
/// - `InsufficientBalance` → 422 Unprocessable Entity
/// - `AccountNotFound` → 404 Not Found
/// - `Backend` → 503 if retryable, 500 otherwise (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::EmailAlreadyInUse => (
                StatusCode::CONFLICT,
                "email_already_in_use",
                self.to_string(),
            ),
            AppError::InvalidAmount(_) => {
                (StatusCode::BAD_REQUEST, "invalid_amount", self.to_string())
            }
            AppError::InsufficientBalance => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_balance",
                self.to_string(),
            ),
            AppError::InvalidPayload(_) => {
                (StatusCode::BAD_REQUEST, "invalid_payload", self.to_string())
            }
            AppError::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                "invalid_session",
                self.to_string(),
            ),
            AppError::AccountNotFound => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Backend(ref err) if err.is_retryable() => (
                StatusCode::SERVICE_UNAVAILABLE,
                "backend_unavailable",
                "The wallet backend is temporarily unavailable".to_string(),
            ),
            AppError::Backend(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        // Return the response with status code and JSON body
        (status, body).into_response()
    }
}
