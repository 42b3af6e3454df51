//! Reduces a [`ResultSet`] to a [`Summary`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::outcome::{OutcomeStatus, ResultSet};
use crate::percentiles::{latency_stats, LatencyStats};

/// Aggregated view over one run, derived from its [`ResultSet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub success: usize,
    pub empty_response: usize,
    pub exception: usize,

    /// Latencies (seconds) of successful requests only, ascending.
    pub success_latencies: Vec<f64>,

    /// Percentiles over `success_latencies`; `None` when nothing succeeded.
    pub latency_stats: Option<LatencyStats>,

    /// Exception descriptions and how often each occurred.
    pub errors_by_message: BTreeMap<String, usize>,

    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,

    /// Outcomes per second of wall-clock run time.
    pub throughput_rps: f64,
}

impl Summary {
    pub fn count(&self, status: OutcomeStatus) -> usize {
        match status {
            OutcomeStatus::Success => self.success,
            OutcomeStatus::EmptyResponse => self.empty_response,
            OutcomeStatus::Exception => self.exception,
        }
    }

    /// Everything that did not produce usable output.
    pub fn error_count(&self) -> usize {
        self.empty_response + self.exception
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64
        }
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Count outcomes per status and collect the success latency distribution.
///
/// Pure and order-independent: the same result set always yields the same
/// summary.
pub fn aggregate(results: &ResultSet) -> Summary {
    let mut success = 0;
    let mut empty_response = 0;
    let mut exception = 0;
    let mut success_durations = Vec::new();
    let mut errors_by_message = BTreeMap::new();

    for outcome in results {
        match outcome.status() {
            OutcomeStatus::Success => {
                success += 1;
                success_durations.push(outcome.latency());
            }
            OutcomeStatus::EmptyResponse => empty_response += 1,
            OutcomeStatus::Exception => {
                exception += 1;
                let message = outcome.error().unwrap_or_default().to_string();
                *errors_by_message.entry(message).or_insert(0) += 1;
            }
        }
    }

    success_durations.sort();
    let latency_stats = latency_stats(success_durations.iter().copied());
    let success_latencies = success_durations
        .iter()
        .map(Duration::as_secs_f64)
        .collect();

    let elapsed = results.elapsed();
    let throughput_rps = if elapsed.as_secs_f64() > 0.0 {
        results.len() as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    Summary {
        total: results.len(),
        success,
        empty_response,
        exception,
        success_latencies,
        latency_stats,
        errors_by_message,
        elapsed,
        throughput_rps,
    }
}
