//! Error types for the SchoolHub API client.
//!
//! # Design
//! `Request` and `Network` are kept apart so callers can show
//! connectivity-specific guidance for the latter. `Request` displays the bare
//! server message because screens surface it to users verbatim.
//! `ImageProcessing` is raised before any request leaves the client.

use thiserror::Error;

/// Errors returned by `SchoolClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status. `message` is the server's
    /// `message` field when present, otherwise `HTTP <status>: <reason>`.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("Unable to reach the server. Please check your internet connection and try again. ({0})")]
    Network(String),

    /// A local image could not be converted into a data URI.
    #[error("image processing failed: {0}")]
    ImageProcessing(String),

    /// 2xx response whose envelope reports `success: false`, or lacks a
    /// field the operation requires.
    #[error("{0}")]
    Rejected(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The key-value store backing the session failed.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Fieldless category of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Request,
    Network,
    ImageProcessing,
    Rejected,
    Deserialization,
    Serialization,
    Storage,
    InvalidRequest,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Request { .. } => ErrorKind::Request,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::ImageProcessing(_) => ErrorKind::ImageProcessing,
            ApiError::Rejected(_) => ErrorKind::Rejected,
            ApiError::Deserialization(_) => ErrorKind::Deserialization,
            ApiError::Serialization(_) => ErrorKind::Serialization,
            ApiError::Storage(_) => ErrorKind::Storage,
            ApiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// HTTP status for `Request` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_displays_server_message_only() {
        let err = ApiError::Request {
            status: 404,
            message: "Not found".to_string(),
        };
        assert_eq!(err.to_string(), "Not found");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.kind(), ErrorKind::Request);
    }

    #[test]
    fn network_error_mentions_connectivity() {
        let err = ApiError::Network("connection refused".to_string());
        let msg = err.to_string();
        assert!(msg.contains("internet connection"));
        assert!(msg.contains("connection refused"));
        assert_eq!(err.status(), None);
    }
}
