//! Executes one conversion request and turns whatever happens into a
//! [`RequestOutcome`].
//!
//! Nothing fatal crosses this boundary: converter errors, empty output, timeouts
//! and even a panicking converter all come back as data.

use bytes::Bytes;
use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinError;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, warn};

use crate::converter::{ConvertError, RemoteConverter};
use crate::errors::ErrorCategory;
use crate::metrics::{
    CONCURRENT_REQUESTS, REQUEST_DURATION_SECONDS, REQUEST_ERRORS_BY_CATEGORY, REQUEST_OUTCOMES,
    REQUEST_TOTAL,
};
use crate::outcome::RequestOutcome;

/// Wraps a single converter call with timing and outcome classification.
///
/// Cloning a runner is cheap: the converter, payload and format are all
/// reference counted and shared read-only by every in-flight request.
#[derive(Clone)]
pub struct RequestRunner {
    converter: Arc<dyn RemoteConverter>,
    payload: Bytes,
    target_format: Arc<str>,
    timeout: Option<Duration>,
}

impl RequestRunner {
    pub fn new(
        converter: Arc<dyn RemoteConverter>,
        payload: Bytes,
        target_format: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            converter,
            payload,
            target_format: target_format.into(),
            timeout: None,
        }
    }

    /// Bound each call; an expired call is reported as an exception.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issue exactly one converter call and classify it.
    pub async fn run(&self, request_id: usize) -> RequestOutcome {
        CONCURRENT_REQUESTS.inc();
        REQUEST_TOTAL.inc();

        let start = Instant::now();

        // The call runs in its own task so a panicking converter is contained.
        let converter = Arc::clone(&self.converter);
        let payload = self.payload.clone();
        let format = Arc::clone(&self.target_format);
        let mut handle = tokio::spawn(async move { converter.convert(payload, &format).await });

        let joined = match self.timeout {
            Some(limit) => match time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    // Wait for the cancelled call to be dropped so the slot is
                    // really free before the caller issues the next request.
                    handle.abort();
                    let _ = handle.await;
                    Ok(Err(ConvertError::Timeout(limit)))
                }
            },
            None => handle.await,
        };

        let latency = start.elapsed();
        let result = joined.unwrap_or_else(|e| Err(ConvertError::Other(describe_join_error(e))));

        if let Err(ref e) = result {
            let category = ErrorCategory::from_convert_error(e);
            REQUEST_ERRORS_BY_CATEGORY
                .with_label_values(&[category.label()])
                .inc();
            warn!(
                request_id = request_id,
                converter = self.converter.name(),
                error = %e,
                error_category = category.label(),
                latency_ms = latency.as_millis() as u64,
                "Conversion request failed"
            );
        }

        let outcome = classify(result, latency);

        REQUEST_OUTCOMES
            .with_label_values(&[outcome.status().label()])
            .inc();
        REQUEST_DURATION_SECONDS.observe(latency.as_secs_f64());
        CONCURRENT_REQUESTS.dec();

        debug!(
            request_id = request_id,
            status = outcome.status().label(),
            latency_ms = latency.as_millis() as u64,
            "Conversion request completed"
        );

        outcome
    }
}

/// Map a converter result to an outcome.
///
/// A failure is always an exception, never an empty response; an `Ok` with no
/// bytes is always an empty response, never an exception.
pub fn classify(result: Result<Vec<u8>, ConvertError>, latency: Duration) -> RequestOutcome {
    match result {
        Err(e) => RequestOutcome::exception(latency, e.to_string()),
        Ok(output) if output.is_empty() => RequestOutcome::empty_response(latency),
        Ok(_) => RequestOutcome::success(latency),
    }
}

fn describe_join_error(error: JoinError) -> String {
    if error.is_panic() {
        format!("request task panicked: {}", panic_message(error.into_panic()))
    } else {
        "request task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OutcomeStatus;

    #[test]
    fn test_classify_non_empty_output() {
        let outcome = classify(Ok(b"%PDF-1.7".to_vec()), Duration::from_millis(12));
        assert_eq!(outcome.status(), OutcomeStatus::Success);
        assert_eq!(outcome.latency(), Duration::from_millis(12));
    }

    #[test]
    fn test_classify_empty_output() {
        let outcome = classify(Ok(Vec::new()), Duration::from_millis(3));
        assert_eq!(outcome.status(), OutcomeStatus::EmptyResponse);
        assert!(outcome.error().is_none());
    }

    #[test]
    fn test_classify_failure() {
        let outcome = classify(
            Err(ConvertError::other("connection refused")),
            Duration::from_millis(7),
        );
        assert_eq!(outcome.status(), OutcomeStatus::Exception);
        assert_eq!(outcome.error(), Some("connection refused"));
        assert_eq!(outcome.latency(), Duration::from_millis(7));
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new("owned".to_string())), "owned");
        assert_eq!(panic_message(Box::new(42u8)), "unknown panic");
    }
}
