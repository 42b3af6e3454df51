//! The remote conversion call the load test drives.
//!
//! The harness never interprets payload or output contents; it only needs a
//! call that takes the shared payload and a target format and either returns
//! bytes or fails.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Failure signalled by a [`RemoteConverter`].
///
/// The `Display` output becomes the `error` text of an exception outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// Connection, DNS or body transfer failure.
    #[error("{0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The call did not finish within the allowed time.
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

impl ConvertError {
    pub fn other(message: impl Into<String>) -> Self {
        ConvertError::Other(message.into())
    }
}

/// A remote document converter.
///
/// `payload` is a cheap reference-counted handle; implementations must not
/// mutate it. An `Ok` with an empty vector is a valid, degenerate response.
#[async_trait]
pub trait RemoteConverter: Send + Sync {
    async fn convert(&self, payload: Bytes, target_format: &str) -> Result<Vec<u8>, ConvertError>;

    /// Short identifier used in logs.
    fn name(&self) -> &str {
        "converter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_message() {
        assert_eq!(
            ConvertError::other("connection refused").to_string(),
            "connection refused"
        );
        assert_eq!(
            ConvertError::Transport("dns failure".to_string()).to_string(),
            "dns failure"
        );
    }

    #[test]
    fn test_status_and_timeout_display() {
        let err = ConvertError::Status {
            code: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: busy");

        let err = ConvertError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "request timed out after 1.5s");
    }
}
