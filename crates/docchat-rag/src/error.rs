//! Error types for the document chat service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration (chunk window/overlap, retrieval settings, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document content could not be extracted
    #[error("Failed to extract text from '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Declared format is not one of pdf, docx, txt
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// A chunk with the same (source, position) is already indexed
    #[error("Chunk {position} of '{document}' is already indexed")]
    DuplicateKey { document: String, position: usize },

    /// Generation or embedding service failure
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Query string was missing or blank
    #[error("No message provided")]
    EmptyQuery,

    /// Upload request carried no files
    #[error("No files provided")]
    NoFiles,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an external service error
    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalService(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// Format, configuration and integrity errors are deterministic and never
    /// retryable. Service failures are, and so are transient IO conditions.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ExternalService(_) | Error::Http(_) => true,
            Error::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::Extraction { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "extraction_error"),
            Error::UnsupportedFormat(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_format")
            }
            Error::DuplicateKey { .. } => (StatusCode::CONFLICT, "duplicate_key"),
            Error::ExternalService(_) => (StatusCode::BAD_GATEWAY, "external_service_error"),
            Error::EmptyQuery => (StatusCode::BAD_REQUEST, "empty_query"),
            Error::NoFiles => (StatusCode::BAD_REQUEST, "no_files"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(Error::external("timeout").is_retryable());
        assert!(Error::Io(std::io::Error::from(std::io::ErrorKind::Interrupted)).is_retryable());

        assert!(!Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound)).is_retryable());
        assert!(!Error::extraction("a.pdf", "corrupt").is_retryable());
        assert!(!Error::UnsupportedFormat("xls".into()).is_retryable());
        assert!(!Error::config("overlap >= window").is_retryable());
        assert!(!Error::DuplicateKey { document: "a.txt".into(), position: 0 }.is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::EmptyQuery.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::UnsupportedFormat("xls".into()).into_response().status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            Error::DuplicateKey { document: "a.txt".into(), position: 3 }
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
    }
}
