//! Error categorization and run-level errors.
//!
//! Per-request failures never leave the runner as errors; they become exception
//! outcomes. This module classifies them into categories for metrics and
//! reporting, and defines the one fatal error of a run: failing to obtain the
//! payload before any request is issued.

use std::path::PathBuf;
use thiserror::Error;

use crate::converter::ConvertError;

/// Categories of converter failures seen during a load test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, DNS or body transfer errors
    TransportError,

    /// Request timeout errors
    TimeoutError,

    /// HTTP 4xx responses
    ClientError,

    /// HTTP 5xx responses
    ServerError,

    /// Other/unknown errors
    OtherError,
}

impl ErrorCategory {
    /// Categorize a converter failure.
    pub fn from_convert_error(error: &ConvertError) -> Self {
        match error {
            ConvertError::Transport(msg) => {
                if msg.to_lowercase().contains("timed out") {
                    ErrorCategory::TimeoutError
                } else {
                    ErrorCategory::TransportError
                }
            }
            ConvertError::Timeout(_) => ErrorCategory::TimeoutError,
            ConvertError::Status { code, .. } => match code {
                400..=499 => ErrorCategory::ClientError,
                500..=599 => ErrorCategory::ServerError,
                _ => ErrorCategory::OtherError,
            },
            ConvertError::Other(msg) => {
                let msg = msg.to_lowercase();
                if msg.contains("timeout") || msg.contains("timed out") {
                    ErrorCategory::TimeoutError
                } else if msg.contains("connection") || msg.contains("dns") {
                    ErrorCategory::TransportError
                } else {
                    ErrorCategory::OtherError
                }
            }
        }
    }

    /// Get the Prometheus label for this error category.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::TransportError => "transport",
            ErrorCategory::TimeoutError => "timeout",
            ErrorCategory::ClientError => "http_4xx",
            ErrorCategory::ServerError => "http_5xx",
            ErrorCategory::OtherError => "other",
        }
    }
}

/// Fatal errors raised before a run starts. No requests are issued.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Failed to read payload file {path:?}: {source}")]
    PayloadRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_categorize_status_errors() {
        let client = ConvertError::Status {
            code: 415,
            body: String::new(),
        };
        let server = ConvertError::Status {
            code: 502,
            body: String::new(),
        };
        assert_eq!(
            ErrorCategory::from_convert_error(&client),
            ErrorCategory::ClientError
        );
        assert_eq!(
            ErrorCategory::from_convert_error(&server),
            ErrorCategory::ServerError
        );
    }

    #[test]
    fn test_categorize_timeouts() {
        assert_eq!(
            ErrorCategory::from_convert_error(&ConvertError::Timeout(Duration::from_secs(1))),
            ErrorCategory::TimeoutError
        );
        assert_eq!(
            ErrorCategory::from_convert_error(&ConvertError::other("operation timed out")),
            ErrorCategory::TimeoutError
        );
    }

    #[test]
    fn test_categorize_free_text() {
        assert_eq!(
            ErrorCategory::from_convert_error(&ConvertError::other("connection refused")),
            ErrorCategory::TransportError
        );
        assert_eq!(
            ErrorCategory::from_convert_error(&ConvertError::other("bad document")),
            ErrorCategory::OtherError
        );
    }

    #[test]
    fn test_error_category_labels() {
        assert_eq!(ErrorCategory::TransportError.label(), "transport");
        assert_eq!(ErrorCategory::TimeoutError.label(), "timeout");
        assert_eq!(ErrorCategory::ClientError.label(), "http_4xx");
        assert_eq!(ErrorCategory::ServerError.label(), "http_5xx");
        assert_eq!(ErrorCategory::OtherError.label(), "other");
    }

    #[test]
    fn test_setup_error_display() {
        let err = SetupError::PayloadRead {
            path: PathBuf::from("missing.docx"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("missing.docx"));
    }
}
