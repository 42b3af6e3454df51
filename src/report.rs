//! Plain-text report of a run: status counts, latency percentiles and a
//! histogram of successful request latencies.

use crate::aggregator::Summary;
use crate::outcome::OutcomeStatus;

/// Widest histogram bar, in characters.
const BAR_WIDTH: usize = 50;

/// Errors listed in the report, most frequent first.
const TOP_ERRORS: usize = 5;

/// One equal-width latency bucket, bounds in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Bucket latencies into `bins` equal-width bins spanning min..=max.
///
/// Returns an empty vector when there are no latencies or `bins` is zero. When
/// every latency is identical, a single bin holds them all.
pub fn latency_histogram(latencies: &[f64], bins: usize) -> Vec<HistogramBin> {
    if latencies.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = latencies.iter().copied().fold(f64::INFINITY, f64::min);
    let max = latencies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    if width <= 0.0 {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: latencies.len(),
        }];
    }

    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &latency in latencies {
        // The maximum lands exactly on the upper edge; keep it in the last bin.
        let index = (((latency - min) / width) as usize).min(bins - 1);
        histogram[index].count += 1;
    }

    histogram
}

/// Render the full text report for a summary.
pub fn format_report(summary: &Summary, bins: usize) -> String {
    let mut out = String::from("\n## Outcomes\n\n");

    out.push_str(&format!("{:<20} {:>10}\n", "Status", "Count"));
    out.push_str(&format!("{}\n", "-".repeat(31)));
    for status in OutcomeStatus::all() {
        out.push_str(&format!(
            "{:<20} {:>10}\n",
            status.label(),
            summary.count(status)
        ));
    }
    out.push_str(&format!("{:<20} {:>10}\n", "total", summary.total));
    out.push_str(&format!(
        "\nSuccess vs Error: {} / {} ({:.1}% success)\n",
        summary.success,
        summary.error_count(),
        summary.success_rate() * 100.0
    ));
    out.push_str(&format!(
        "Elapsed: {:.2}s, throughput: {:.2} req/s\n",
        summary.elapsed.as_secs_f64(),
        summary.throughput_rps
    ));

    out.push_str("\n## Success Latency (ms)\n\n");
    match summary.latency_stats {
        Some(ref stats) => out.push_str(&stats.format_table()),
        None => out.push_str("No successful requests.\n"),
    }

    let histogram = latency_histogram(&summary.success_latencies, bins);
    if !histogram.is_empty() {
        out.push_str("\n## Latency Distribution (s)\n\n");
        out.push_str(&format_histogram(&histogram));
    }

    if !summary.errors_by_message.is_empty() {
        out.push_str("\n## Errors\n\n");
        let mut errors: Vec<_> = summary.errors_by_message.iter().collect();
        errors.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (message, count) in errors.into_iter().take(TOP_ERRORS) {
            out.push_str(&format!("{:>8}  {}\n", count, message));
        }
    }

    out
}

fn format_histogram(histogram: &[HistogramBin]) -> String {
    let peak = histogram.iter().map(|b| b.count).max().unwrap_or(0);
    let mut out = String::new();

    for bin in histogram {
        let bar_len = if peak == 0 {
            0
        } else {
            (bin.count * BAR_WIDTH).div_ceil(peak)
        };
        out.push_str(&format!(
            "{:>9.3} - {:<9.3} | {:<width$} {}\n",
            bin.lower,
            bin.upper,
            "#".repeat(bar_len),
            bin.count,
            width = BAR_WIDTH
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::outcome::{RequestOutcome, ResultSet};
    use std::time::Duration;

    #[test]
    fn test_histogram_counts_every_sample() {
        let latencies = vec![0.1, 0.2, 0.2, 0.3, 0.5, 1.0];
        let histogram = latency_histogram(&latencies, 3);

        assert_eq!(histogram.len(), 3);
        assert_eq!(histogram.iter().map(|b| b.count).sum::<usize>(), 6);
        assert_eq!(histogram[0].count, 4);
        assert_eq!(histogram[1].count, 1);
        assert_eq!(histogram[2].count, 1);
        assert!((histogram[0].lower - 0.1).abs() < 1e-12);
        assert!((histogram[2].upper - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_identical_values() {
        let histogram = latency_histogram(&[0.4, 0.4, 0.4], 30);
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram[0].count, 3);
    }

    #[test]
    fn test_histogram_empty_input() {
        assert!(latency_histogram(&[], 30).is_empty());
        assert!(latency_histogram(&[0.1], 0).is_empty());
    }

    #[test]
    fn test_report_sections() {
        let results = ResultSet::new(
            vec![
                RequestOutcome::success(Duration::from_millis(120)),
                RequestOutcome::success(Duration::from_millis(180)),
                RequestOutcome::empty_response(Duration::from_millis(40)),
                RequestOutcome::exception(Duration::from_millis(2), "connection refused"),
            ],
            Duration::from_secs(1),
        );
        let report = format_report(&aggregate(&results), 10);

        assert!(report.contains("## Outcomes"));
        assert!(report.contains("Success vs Error: 2 / 2"));
        assert!(report.contains("## Latency Distribution"));
        assert!(report.contains("connection refused"));
    }

    #[test]
    fn test_report_lists_every_status() {
        let results = ResultSet::new(
            vec![
                RequestOutcome::success(Duration::from_millis(10)),
                RequestOutcome::exception(Duration::from_millis(2), "boom"),
                RequestOutcome::exception(Duration::from_millis(3), "boom"),
            ],
            Duration::from_secs(1),
        );
        let report = format_report(&aggregate(&results), 30);
        let row = |label: &str| {
            report
                .lines()
                .find(|line| line.split_whitespace().next() == Some(label))
                .map(|line| line.split_whitespace().last().unwrap_or("").to_string())
        };

        assert_eq!(row("success").as_deref(), Some("1"));
        assert_eq!(row("empty_response").as_deref(), Some("0"));
        assert_eq!(row("exception").as_deref(), Some("2"));
        assert_eq!(row("total").as_deref(), Some("3"));
    }

    #[test]
    fn test_report_without_successes() {
        let results = ResultSet::new(
            vec![RequestOutcome::exception(Duration::from_millis(2), "boom")],
            Duration::from_secs(1),
        );
        let report = format_report(&aggregate(&results), 30);
        assert!(report.contains("No successful requests."));
        assert!(!report.contains("## Latency Distribution"));
    }
}
