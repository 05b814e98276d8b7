use crate::extract::ExtractError;
use crate::fetch::FetchError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data, e.g. a missing URL or an unsupported file type
    #[error("{message}")]
    BadRequest { message: String },

    /// Downloading the remote file failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The downloaded file could not be parsed as its declared type
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Fetch(FetchError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Fetch(FetchError::Request(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message returned to the caller.
    ///
    /// Fetch and extraction failures carry the underlying library message so callers can tell a
    /// dead link from a corrupt file.
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::Fetch(e) => e.to_string(),
            Error::Extraction(e) => e.to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Fetch(FetchError::TooLarge { size, limit }) => {
                tracing::info!(size, limit, "Rejected oversized file");
            }
            Error::Fetch(_) | Error::Extraction(_) | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorResponse { error: self.user_message() };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
