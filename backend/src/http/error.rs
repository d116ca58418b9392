//! HTTP error handling and response types.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::repository::RepositoryError;
use crate::services::IngestError;
use crate::tracks::TrackError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request shape (query, multipart framing)
    BadRequest(String),
    /// Track validation or parse failure
    Track(TrackError),
    /// Internal server error
    Internal(String),
    /// Repository error, message passed through verbatim
    Repository(RepositoryError),
}

impl AppError {
    /// Status code and body for this error.
    pub fn to_api_error(&self) -> (StatusCode, ApiError) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::Track(TrackError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("VALIDATION_ERROR", msg),
            ),
            AppError::Track(e @ TrackError::Parse { file, .. }) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("PARSE_ERROR", e.to_string()).with_details(format!("file={}", file)),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", e.to_string()))
            }
            AppError::Repository(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("REPOSITORY_ERROR", e.to_string()),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_api_error();
        if status.is_server_error() {
            error!(code = %body.code, message = %body.message, "request failed");
        }
        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<TrackError> for AppError {
    fn from(err: TrackError) -> Self {
        AppError::Track(err)
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Track(e) => AppError::Track(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let (status, body) = AppError::from(TrackError::validation("bad")).to_api_error();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.message, "bad");
    }

    #[test]
    fn test_parse_maps_to_400_with_file() {
        let (status, body) = AppError::from(TrackError::parse("a.gpx", "oops")).to_api_error();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "PARSE_ERROR");
        assert_eq!(body.details.as_deref(), Some("file=a.gpx"));
    }

    #[test]
    fn test_repository_message_is_verbatim() {
        let err = RepositoryError::query("violates check constraint \"coords_lat_range\"");
        let expected = err.to_string();
        let (status, body) = AppError::from(err).to_api_error();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "REPOSITORY_ERROR");
        assert_eq!(body.message, expected);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, _) = AppError::from(RepositoryError::not_found("juncture 9")).to_api_error();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_failure_is_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let (status, body) = AppError::from(IngestError::from(io)).to_api_error();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.message.contains("disk full"));
    }
}
