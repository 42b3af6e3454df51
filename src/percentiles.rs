//! Percentile latency statistics using HDR Histogram.
//!
//! Latencies are recorded in microseconds, from 1μs up to one hour with 3
//! significant digits. Values outside that range are clamped.

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const MIN_LATENCY_US: u64 = 1;
const MAX_LATENCY_US: u64 = 3_600_000_000;

/// Percentile statistics for a set of latency measurements.
///
/// All values are in microseconds except `mean`, which is fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Number of samples
    pub count: u64,

    /// Minimum value (microseconds)
    pub min: u64,

    /// Maximum value (microseconds)
    pub max: u64,

    /// Mean/average value (microseconds)
    pub mean: f64,

    /// 50th percentile - median (microseconds)
    pub p50: u64,

    /// 90th percentile (microseconds)
    pub p90: u64,

    /// 95th percentile (microseconds)
    pub p95: u64,

    /// 99th percentile (microseconds)
    pub p99: u64,

    /// 99.9th percentile (microseconds)
    pub p99_9: u64,
}

impl LatencyStats {
    /// Format statistics as a human-readable string.
    pub fn format(&self) -> String {
        format!(
            "count={}, min={:.2}ms, max={:.2}ms, mean={:.2}ms, p50={:.2}ms, p90={:.2}ms, p95={:.2}ms, p99={:.2}ms, p99.9={:.2}ms",
            self.count,
            self.min as f64 / 1000.0,
            self.max as f64 / 1000.0,
            self.mean / 1000.0,
            self.p50 as f64 / 1000.0,
            self.p90 as f64 / 1000.0,
            self.p95 as f64 / 1000.0,
            self.p99 as f64 / 1000.0,
            self.p99_9 as f64 / 1000.0,
        )
    }

    /// Format as a table header plus one row, in milliseconds.
    pub fn format_table(&self) -> String {
        let mut output = format!(
            "{:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
            "Count", "P50", "P90", "P95", "P99", "P99.9", "Mean", "Max"
        );
        output.push_str(&format!(
            "{:>8} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}\n",
            self.count,
            self.p50 as f64 / 1000.0,
            self.p90 as f64 / 1000.0,
            self.p95 as f64 / 1000.0,
            self.p99 as f64 / 1000.0,
            self.p99_9 as f64 / 1000.0,
            self.mean / 1000.0,
            self.max as f64 / 1000.0,
        ));
        output
    }
}

/// Latency histogram for a single run.
pub struct LatencyHistogram {
    histogram: Option<Histogram<u64>>,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        let histogram = match Histogram::new_with_bounds(MIN_LATENCY_US, MAX_LATENCY_US, 3) {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(error = %e, "Failed to create latency histogram");
                None
            }
        };
        Self { histogram }
    }

    /// Record a latency measurement.
    pub fn record(&mut self, latency: Duration) {
        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.record_us(latency_us);
    }

    /// Record a latency measurement in microseconds.
    pub fn record_us(&mut self, latency_us: u64) {
        let Some(hist) = self.histogram.as_mut() else {
            return;
        };

        let clamped = latency_us.clamp(MIN_LATENCY_US, MAX_LATENCY_US);
        if let Err(e) = hist.record(clamped) {
            warn!(
                latency_us = latency_us,
                error = %e,
                "Failed to record latency in histogram"
            );
        }
    }

    /// Current statistics, or `None` if nothing was recorded.
    pub fn stats(&self) -> Option<LatencyStats> {
        let hist = self.histogram.as_ref()?;
        if hist.is_empty() {
            return None;
        }

        Some(LatencyStats {
            count: hist.len(),
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_quantile(0.50),
            p90: hist.value_at_quantile(0.90),
            p95: hist.value_at_quantile(0.95),
            p99: hist.value_at_quantile(0.99),
            p99_9: hist.value_at_quantile(0.999),
        })
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute statistics for a batch of latencies.
pub fn latency_stats<I>(latencies: I) -> Option<LatencyStats>
where
    I: IntoIterator<Item = Duration>,
{
    let mut histogram = LatencyHistogram::new();
    for latency in latencies {
        histogram.record(latency);
    }
    histogram.stats()
}
