//! Per-request outcomes and the result set produced by a run.
//!
//! Every issued request yields exactly one [`RequestOutcome`]. Outcomes are
//! immutable once built; the constructors are the only way to create one, which
//! keeps `error` present exactly when the status is [`OutcomeStatus::Exception`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Classification of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The converter returned non-empty output.
    Success,

    /// The converter reported success but returned no bytes.
    EmptyResponse,

    /// The converter failed (transport, protocol, timeout, panic).
    Exception,
}

impl OutcomeStatus {
    /// Label used in CSV rows and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::EmptyResponse => "empty_response",
            OutcomeStatus::Exception => "exception",
        }
    }

    /// All statuses in a consistent order.
    pub fn all() -> [OutcomeStatus; 3] {
        [
            OutcomeStatus::Success,
            OutcomeStatus::EmptyResponse,
            OutcomeStatus::Exception,
        ]
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The classified result of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    status: OutcomeStatus,
    latency: Duration,
    error: Option<String>,
}

impl RequestOutcome {
    pub fn success(latency: Duration) -> Self {
        Self {
            status: OutcomeStatus::Success,
            latency,
            error: None,
        }
    }

    pub fn empty_response(latency: Duration) -> Self {
        Self {
            status: OutcomeStatus::EmptyResponse,
            latency,
            error: None,
        }
    }

    pub fn exception(latency: Duration, error: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Exception,
            latency,
            error: Some(error.into()),
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    /// Wall-clock time from request start to completion or failure.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn latency_secs(&self) -> f64 {
        self.latency.as_secs_f64()
    }

    /// Failure description, only set for [`OutcomeStatus::Exception`].
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// All outcomes of one run, in completion order.
///
/// Consumers must not rely on the ordering. Outcomes cannot be changed once the
/// set is built.
#[derive(Debug, Clone)]
pub struct ResultSet {
    outcomes: Vec<RequestOutcome>,
    elapsed: Duration,
}

impl ResultSet {
    pub fn new(outcomes: Vec<RequestOutcome>, elapsed: Duration) -> Self {
        Self { outcomes, elapsed }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[RequestOutcome] {
        &self.outcomes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RequestOutcome> {
        self.outcomes.iter()
    }

    /// Wall-clock duration of the whole run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of outcomes with the given status.
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a RequestOutcome;
    type IntoIter = std::slice::Iter<'a, RequestOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}
