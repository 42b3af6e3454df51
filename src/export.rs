//! Writes run results to disk: one CSV row per request, and the summary as JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::aggregator::Summary;
use crate::outcome::ResultSet;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// CSV header row, one record per outcome follows.
pub const CSV_HEADER: [&str; 3] = ["Status", "Latency (s)", "Error"];

/// Write every outcome as `status, latency seconds, error`.
pub fn write_results_csv<W: Write>(writer: W, results: &ResultSet) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for outcome in results {
        let latency = outcome.latency_secs().to_string();
        csv_writer.write_record([
            outcome.status().label(),
            latency.as_str(),
            outcome.error().unwrap_or(""),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn save_results_csv<P: AsRef<Path>>(path: P, results: &ResultSet) -> Result<(), ExportError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_results_csv(BufWriter::new(file), results)?;
    info!(path = %path.display(), rows = results.len(), "Results saved to CSV");
    Ok(())
}

pub fn save_summary_json<P: AsRef<Path>>(path: P, summary: &Summary) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;
    info!(path = %path.display(), "Summary saved to JSON");
    Ok(())
}
