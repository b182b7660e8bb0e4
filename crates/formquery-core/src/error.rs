//! Error types for query encoding and request execution.
//!
//! Projection and encoding of typed records never fail. Errors surface only at
//! the edges: projecting an untyped serde value that is not a record, building
//! a URL, loading configuration, or executing a request.

use serde::Serialize;
use thiserror::Error;

/// Main error type for formquery operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The projected value is not a record (struct or map).
    #[error("Cannot project a non-record value into a query: {0}")]
    NotARecord(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid base URL or path
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Response carried a status other than the expected one
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// Status code returned by the server
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request body could not be encoded
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for formquery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotARecord(_) => "NOT_A_RECORD",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::UnexpectedStatus { .. } => "UNEXPECTED_STATUS",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }

    /// Returns the HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::NotARecord("number".to_string()).error_code(),
            "NOT_A_RECORD"
        );
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            Error::InvalidEndpoint("test".to_string()).error_code(),
            "INVALID_ENDPOINT"
        );
        assert_eq!(
            Error::HttpError("test".to_string()).error_code(),
            "HTTP_ERROR"
        );
        assert_eq!(Error::Timeout("test".to_string()).error_code(), "TIMEOUT");
        assert_eq!(
            Error::UnexpectedStatus {
                status: 500,
                body: String::new()
            }
            .error_code(),
            "UNEXPECTED_STATUS"
        );
        assert_eq!(
            Error::Decode("test".to_string()).error_code(),
            "DECODE_ERROR"
        );
        assert_eq!(
            Error::Encode("test".to_string()).error_code(),
            "ENCODE_ERROR"
        );
        assert_eq!(
            Error::ValidationError("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::UnexpectedStatus {
            status: 404,
            body: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status 404: missing");
        assert_eq!(err.status(), Some(404));

        let err = Error::NotARecord("array".to_string());
        assert_eq!(
            err.to_string(),
            "Cannot project a non-record value into a query: array"
        );
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_into_error_response() {
        let response = Error::Timeout("slow".to_string()).into_error_response();
        assert_eq!(response.code, "TIMEOUT");
        assert_eq!(response.message, "Request timed out: slow");

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("TIMEOUT"));
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::Decode(_)));
    }
}
