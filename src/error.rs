//! Error types for umanager.
//!
//! Uses thiserror for ergonomic error definitions that integrate
//! with axum's response system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tonic::Status;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Request errors
    #[error("{0}")]
    InvalidInput(String),

    // Service layer errors
    /// A failed service call. Answered as a server error whatever the status
    /// code was.
    #[error("{}", .0.message())]
    Service(Status),

    /// A failed lookup-style service call, answered as a client error.
    #[error("{}", .0.message())]
    Lookup(Status),

    // Persistence errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400
            Self::InvalidInput(_) | Self::Lookup(_) => StatusCode::BAD_REQUEST,

            // 500
            Self::NotFound(_) | Self::Service(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "BadRequest",
            _ => "InternalServerError",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code, "request failed: {}", message);
        } else {
            tracing::debug!(code, "request rejected: {}", message);
        }

        let body = Json(json!({
            "code": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("invalid request body: {}", err))
    }
}
