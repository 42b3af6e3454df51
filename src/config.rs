use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tokio::time::Duration;

use crate::client::ClientConfig;
use crate::dispatcher::{DispatchMode, PayloadSource, RunConfig};
use crate::utils::parse_duration_string;
use crate::yaml_config::{YamlConfig, YamlConfigError};

/// Errors raised while assembling the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: String, message: String },

    #[error("Failed to load config file: {0}")]
    Yaml(#[from] YamlConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl ConfigError {
    pub fn invalid(var: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var: var.to_string(),
            message: message.into(),
        }
    }
}

/// Main configuration for the load test.
///
/// Precedence: environment variables > YAML file > defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub converter_url: Option<String>,
    pub converter_host: String,
    pub converter_port: u16,
    pub converter_path: String,
    pub input_file: PathBuf,
    pub convert_to: String,
    pub concurrency: usize,
    pub total_requests: usize,
    pub dispatch_mode: DispatchMode,
    pub request_timeout: Option<Duration>,
    pub skip_tls_verify: bool,
    pub custom_headers: Option<String>,
    pub results_csv: PathBuf,
    pub summary_json: Option<PathBuf>,
    pub histogram_bins: usize,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            converter_url: None,
            converter_host: "localhost".to_string(),
            converter_port: 2003,
            converter_path: "/convert".to_string(),
            input_file: PathBuf::from("test.docx"),
            convert_to: "pdf".to_string(),
            concurrency: 50,
            total_requests: 500,
            dispatch_mode: DispatchMode::Pool,
            request_timeout: None,
            skip_tls_verify: false,
            custom_headers: None,
            results_csv: PathBuf::from("load_test_results.csv"),
            summary_json: None,
            histogram_bins: 30,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, reading `CONFIG_FILE`
    /// first when it is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env_string("CONFIG_FILE") {
            Some(path) => {
                let yaml_config = YamlConfig::from_file(&path)?;
                Self::from_yaml_with_env_overrides(&yaml_config)
            }
            None => {
                let mut config = Config::default();
                config.apply_env_overrides()?;
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Builds a configuration from a parsed YAML file, then applies env overrides.
    pub fn from_yaml_with_env_overrides(yaml: &YamlConfig) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let target = &yaml.target;
        if let Some(ref url) = target.url {
            config.converter_url = Some(url.clone());
        }
        if let Some(ref host) = target.host {
            config.converter_host = host.clone();
        }
        if let Some(port) = target.port {
            config.converter_port = port;
        }
        if let Some(ref path) = target.path {
            config.converter_path = path.clone();
        }
        if let Some(ref timeout) = target.timeout {
            config.request_timeout = Some(timeout.to_std_duration()?);
        }
        config.skip_tls_verify = target.skip_tls_verify;
        config.custom_headers = target.custom_headers.clone();

        if let Some(ref file) = yaml.input.file {
            config.input_file = PathBuf::from(file);
        }
        if let Some(ref convert_to) = yaml.input.convert_to {
            config.convert_to = convert_to.clone();
        }

        if let Some(concurrency) = yaml.load.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(total) = yaml.load.total_requests {
            config.total_requests = total;
        }
        if let Some(mode) = yaml.load.mode {
            config.dispatch_mode = mode;
        }

        if let Some(ref csv) = yaml.output.csv {
            config.results_csv = PathBuf::from(csv);
        }
        if let Some(ref json) = yaml.output.summary_json {
            config.summary_json = Some(PathBuf::from(json));
        }
        if let Some(bins) = yaml.output.histogram_bins {
            config.histogram_bins = bins;
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = env_string("CONVERTER_URL") {
            self.converter_url = Some(url);
        }
        if let Some(host) = env_string("CONVERTER_HOST") {
            self.converter_host = host;
        }
        if let Some(port) = env_parse("CONVERTER_PORT")? {
            self.converter_port = port;
        }
        if let Some(path) = env_string("CONVERTER_PATH") {
            self.converter_path = path;
        }
        if let Some(file) = env_string("INPUT_FILE") {
            self.input_file = PathBuf::from(file);
        }
        if let Some(convert_to) = env_string("CONVERT_TO") {
            self.convert_to = convert_to;
        }
        if let Some(concurrency) = env_parse("CONCURRENCY_LEVEL")? {
            self.concurrency = concurrency;
        }
        if let Some(total) = env_parse("TOTAL_REQUESTS")? {
            self.total_requests = total;
        }
        if let Some(mode) = env_parse("DISPATCH_MODE")? {
            self.dispatch_mode = mode;
        }
        if let Some(timeout) = env_string("REQUEST_TIMEOUT") {
            let timeout = parse_duration_string(&timeout).map_err(|e| {
                ConfigError::invalid(
                    "REQUEST_TIMEOUT",
                    format!("invalid duration '{}': {}", timeout, e),
                )
            })?;
            self.request_timeout = Some(timeout);
        }
        if let Some(skip) = env_string("SKIP_TLS_VERIFY") {
            self.skip_tls_verify = skip.to_lowercase() == "true";
        }
        if let Some(headers) = env_string("CUSTOM_HEADERS") {
            self.custom_headers = Some(headers);
        }
        if let Some(csv) = env_string("RESULTS_CSV") {
            self.results_csv = PathBuf::from(csv);
        }
        if let Some(json) = env_string("SUMMARY_JSON") {
            self.summary_json = Some(PathBuf::from(json));
        }
        if let Some(bins) = env_parse("HISTOGRAM_BINS")? {
            self.histogram_bins = bins;
        }
        if let Some(port) = env_parse("METRICS_PORT")? {
            self.metrics_port = Some(port);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::invalid(
                "CONCURRENCY_LEVEL",
                "must be greater than 0",
            ));
        }
        if self.total_requests == 0 {
            return Err(ConfigError::invalid(
                "TOTAL_REQUESTS",
                "must be greater than 0",
            ));
        }
        if self.histogram_bins == 0 {
            return Err(ConfigError::invalid(
                "HISTOGRAM_BINS",
                "must be greater than 0",
            ));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::invalid(
                "REQUEST_TIMEOUT",
                "must be greater than 0",
            ));
        }
        let endpoint = self.endpoint();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::invalid(
                "CONVERTER_URL",
                format!("'{}' must start with http:// or https://", endpoint),
            ));
        }
        if self.convert_to.trim().is_empty() {
            return Err(ConfigError::invalid("CONVERT_TO", "must not be empty"));
        }
        Ok(())
    }

    /// The converter endpoint, either given directly or built from host/port/path.
    pub fn endpoint(&self) -> String {
        match self.converter_url {
            Some(ref url) => url.clone(),
            None => {
                let path = if self.converter_path.starts_with('/') {
                    self.converter_path.clone()
                } else {
                    format!("/{}", self.converter_path)
                };
                format!(
                    "http://{}:{}{}",
                    self.converter_host, self.converter_port, path
                )
            }
        }
    }

    /// Creates a ClientConfig from this Config.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            skip_tls_verify: self.skip_tls_verify,
            custom_headers: self.custom_headers.clone(),
            timeout: self.request_timeout,
        }
    }

    /// Creates the RunConfig for the dispatcher. The payload is read lazily when
    /// the run starts.
    pub fn to_run_config(&self) -> Result<RunConfig, ConfigError> {
        Ok(RunConfig::new(
            self.total_requests,
            self.concurrency,
            PayloadSource::File(self.input_file.clone()),
        )?
        .with_target_format(self.convert_to.clone())
        .with_mode(self.dispatch_mode)
        .with_request_timeout(self.request_timeout))
    }

    /// Prints the configuration summary.
    pub fn print_summary(&self) {
        println!("Starting load test:");
        println!("  Converter endpoint: {}", self.endpoint());
        println!("  Input file: {}", self.input_file.display());
        println!("  Convert to: {}", self.convert_to);
        println!("  Total requests: {}", self.total_requests);
        println!("  Concurrency level: {}", self.concurrency);
        if self.concurrency > self.total_requests {
            println!(
                "    (clamped to {} since it exceeds the total)",
                self.total_requests
            );
        }
        println!("  Dispatch mode: {}", self.dispatch_mode);
        match self.request_timeout {
            Some(timeout) => println!("  Request timeout: {:?}", timeout),
            None => println!("  Request timeout: none"),
        }
        println!("  Skip TLS Verify: {}", self.skip_tls_verify);
        println!("  Results CSV: {}", self.results_csv.display());
        if let Some(ref json) = self.summary_json {
            println!("  Summary JSON: {}", json.display());
        }
    }
}

fn env_string(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env_string(var) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(var, format!("invalid value '{}': {}", raw, e))),
        None => Ok(None),
    }
}
