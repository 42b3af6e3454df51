use std::env;
use std::sync::{Arc, Mutex};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use convert_loadtest::aggregator::aggregate;
use convert_loadtest::client::{build_client, HttpConverter};
use convert_loadtest::config::Config;
use convert_loadtest::dispatcher::BatchDispatcher;
use convert_loadtest::export::{save_results_csv, save_summary_json};
use convert_loadtest::metrics::{gather_metrics_string, register_metrics, start_metrics_server};
use convert_loadtest::report::format_report;

/// Prints helpful configuration documentation.
fn print_config_help() {
    eprintln!("Configuration (environment variables override CONFIG_FILE values):");
    eprintln!("  CONFIG_FILE             - Optional YAML load test plan");
    eprintln!();
    eprintln!("Converter endpoint:");
    eprintln!("  CONVERTER_URL           - Full endpoint URL (overrides host/port/path)");
    eprintln!("  CONVERTER_HOST          - Converter host (default: localhost)");
    eprintln!("  CONVERTER_PORT          - Converter port (default: 2003)");
    eprintln!("  CONVERTER_PATH          - Converter path (default: /convert)");
    eprintln!("  REQUEST_TIMEOUT         - Per-request timeout: 30s, 2m (default: none)");
    eprintln!("  SKIP_TLS_VERIFY         - Skip TLS certificate verification (default: false)");
    eprintln!("  CUSTOM_HEADERS          - Comma-separated headers (use \\, for literal commas)");
    eprintln!();
    eprintln!("Workload:");
    eprintln!("  INPUT_FILE              - Payload file sent with every request (default: test.docx)");
    eprintln!("  CONVERT_TO              - Target format (default: pdf)");
    eprintln!("  TOTAL_REQUESTS          - Total requests to send (default: 500, must be > 0)");
    eprintln!("  CONCURRENCY_LEVEL       - Max requests in flight (default: 50, must be > 0)");
    eprintln!("  DISPATCH_MODE           - pool or wave (default: pool)");
    eprintln!();
    eprintln!("Output:");
    eprintln!("  RESULTS_CSV             - Per-request CSV (default: load_test_results.csv)");
    eprintln!("  SUMMARY_JSON            - Optional JSON summary path");
    eprintln!("  HISTOGRAM_BINS          - Latency histogram bins (default: 30)");
    eprintln!("  METRICS_PORT            - Serve Prometheus metrics on this port");
    eprintln!("  METRIC_NAMESPACE        - Prometheus metric namespace (default: convert_loadtest)");
    eprintln!("  LOG_FORMAT              - text or json (default: text)");
    eprintln!("  RUST_LOG                - Log filter (default: info)");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging();
    register_metrics()?;

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}\n", e);
            print_config_help();
            std::process::exit(1);
        }
    };

    let client = build_client(&config.to_client_config())?.client;
    let converter = Arc::new(HttpConverter::new(client, config.endpoint()));
    let run_config = config.to_run_config()?;

    config.print_summary();

    let registry_arc = Arc::new(Mutex::new(prometheus::default_registry().clone()));
    if let Some(port) = config.metrics_port {
        let registry = registry_arc.clone();
        tokio::spawn(async move {
            start_metrics_server(port, registry).await;
        });
    }

    let dispatcher = BatchDispatcher::new(run_config, converter);
    let results = match dispatcher.run().await {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "Load test could not start");
            return Err(e.into());
        }
    };

    info!("Load test completed. Saving results...");
    let summary = aggregate(&results);
    info!(
        total = summary.total,
        success = summary.success,
        empty_response = summary.empty_response,
        exception = summary.exception,
        "Outcome counts"
    );
    if let Some(ref stats) = summary.latency_stats {
        info!(latency = %stats.format(), "Success latency");
    }

    save_results_csv(&config.results_csv, &results)?;
    if let Some(ref path) = config.summary_json {
        save_summary_json(path, &summary)?;
    }

    println!("{}", format_report(&summary, config.histogram_bins));

    if config.metrics_port.is_some() {
        println!("\n--- FINAL METRICS ---\n{}", gather_metrics_string(&registry_arc));
        println!("--- END OF FINAL METRICS ---\n");
    }

    Ok(())
}
