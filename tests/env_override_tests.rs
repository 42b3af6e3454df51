//! Integration tests for configuration layering.
//!
//! Precedence: env > yaml > defaults.

use convert_loadtest::config::{Config, ConfigError};
use convert_loadtest::dispatcher::DispatchMode;
use convert_loadtest::yaml_config::YamlConfig;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Clear all env vars that could affect config parsing.
fn clean_env() {
    for var in [
        "CONFIG_FILE",
        "CONVERTER_URL",
        "CONVERTER_HOST",
        "CONVERTER_PORT",
        "CONVERTER_PATH",
        "INPUT_FILE",
        "CONVERT_TO",
        "CONCURRENCY_LEVEL",
        "TOTAL_REQUESTS",
        "DISPATCH_MODE",
        "REQUEST_TIMEOUT",
        "SKIP_TLS_VERIFY",
        "CUSTOM_HEADERS",
        "RESULTS_CSV",
        "SUMMARY_JSON",
        "HISTOGRAM_BINS",
        "METRICS_PORT",
    ] {
        env::remove_var(var);
    }
}

const YAML: &str = r#"
version: "1.0"
target:
  host: "yaml-host"
  port: 3000
  timeout: "45s"
input:
  file: "yaml.docx"
  convertTo: "odt"
load:
  concurrency: 8
  totalRequests: 80
  mode: wave
output:
  csv: "yaml.csv"
"#;

#[test]
#[serial]
fn test_defaults_without_env() {
    clean_env();
    let config = Config::from_env().unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.endpoint(), "http://localhost:2003/convert");
    assert_eq!(config.concurrency, 50);
    assert_eq!(config.total_requests, 500);
    assert_eq!(config.dispatch_mode, DispatchMode::Pool);
}

#[test]
#[serial]
fn test_env_values_applied() {
    clean_env();
    env::set_var("CONVERTER_HOST", "remote");
    env::set_var("CONVERTER_PORT", "2004");
    env::set_var("CONCURRENCY_LEVEL", "10");
    env::set_var("TOTAL_REQUESTS", "100");
    env::set_var("DISPATCH_MODE", "wave");
    env::set_var("REQUEST_TIMEOUT", "2m");
    env::set_var("SUMMARY_JSON", "summary.json");

    let config = Config::from_env().unwrap();
    clean_env();

    assert_eq!(config.endpoint(), "http://remote:2004/convert");
    assert_eq!(config.concurrency, 10);
    assert_eq!(config.total_requests, 100);
    assert_eq!(config.dispatch_mode, DispatchMode::Wave);
    assert_eq!(config.request_timeout, Some(Duration::from_secs(120)));
    assert_eq!(config.summary_json, Some(PathBuf::from("summary.json")));
}

#[test]
#[serial]
fn test_yaml_values_used_without_env() {
    clean_env();
    let yaml = YamlConfig::from_str(YAML).unwrap();
    let config = Config::from_yaml_with_env_overrides(&yaml).unwrap();

    assert_eq!(config.endpoint(), "http://yaml-host:3000/convert");
    assert_eq!(config.input_file, PathBuf::from("yaml.docx"));
    assert_eq!(config.convert_to, "odt");
    assert_eq!(config.concurrency, 8);
    assert_eq!(config.total_requests, 80);
    assert_eq!(config.dispatch_mode, DispatchMode::Wave);
    assert_eq!(config.request_timeout, Some(Duration::from_secs(45)));
    assert_eq!(config.results_csv, PathBuf::from("yaml.csv"));
}

#[test]
#[serial]
fn test_env_overrides_yaml() {
    clean_env();
    env::set_var("CONCURRENCY_LEVEL", "3");
    env::set_var("DISPATCH_MODE", "pool");
    env::set_var("CONVERTER_URL", "https://override.example.com/convert");

    let yaml = YamlConfig::from_str(YAML).unwrap();
    let config = Config::from_yaml_with_env_overrides(&yaml).unwrap();
    clean_env();

    assert_eq!(config.concurrency, 3);
    assert_eq!(config.total_requests, 80);
    assert_eq!(config.dispatch_mode, DispatchMode::Pool);
    assert_eq!(config.endpoint(), "https://override.example.com/convert");
}

#[test]
#[serial]
fn test_config_file_env_var() {
    clean_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(YAML.as_bytes()).unwrap();
    env::set_var("CONFIG_FILE", file.path());

    let config = Config::from_env().unwrap();
    clean_env();

    assert_eq!(config.total_requests, 80);
    assert_eq!(config.convert_to, "odt");
}

#[test]
#[serial]
fn test_missing_config_file() {
    clean_env();
    env::set_var("CONFIG_FILE", "/no/such/loadtest.yaml");

    let result = Config::from_env();
    clean_env();

    assert!(matches!(result, Err(ConfigError::Yaml(_))));
}

#[test]
#[serial]
fn test_invalid_number_names_variable() {
    clean_env();
    env::set_var("TOTAL_REQUESTS", "lots");

    let err = Config::from_env().unwrap_err();
    clean_env();

    assert!(err.to_string().contains("TOTAL_REQUESTS"));
}

#[test]
#[serial]
fn test_zero_concurrency_rejected() {
    clean_env();
    env::set_var("CONCURRENCY_LEVEL", "0");

    let err = Config::from_env().unwrap_err();
    clean_env();

    assert!(err.to_string().contains("CONCURRENCY_LEVEL"));
}

#[test]
#[serial]
fn test_unknown_mode_rejected() {
    clean_env();
    env::set_var("DISPATCH_MODE", "adaptive");

    let err = Config::from_env().unwrap_err();
    clean_env();

    assert!(err.to_string().contains("DISPATCH_MODE"));
}

#[test]
#[serial]
fn test_bad_timeout_rejected() {
    clean_env();
    env::set_var("REQUEST_TIMEOUT", "forever");

    let err = Config::from_env().unwrap_err();
    clean_env();

    assert!(err.to_string().contains("REQUEST_TIMEOUT"));
}

#[test]
#[serial]
fn test_zero_timeout_rejected() {
    clean_env();
    env::set_var("REQUEST_TIMEOUT", "0s");

    let err = Config::from_env().unwrap_err();
    clean_env();

    assert!(err.to_string().contains("REQUEST_TIMEOUT"));
}
