//! YAML configuration file support.
//!
//! A YAML file is an alternative to setting every environment variable; it
//! keeps a load test plan under version control. Environment variables still
//! override anything set here (see [`crate::config::Config`]).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration as StdDuration;
use thiserror::Error;

use crate::dispatcher::DispatchMode;

/// Errors that can occur when loading or parsing YAML configuration.
#[derive(Error, Debug)]
pub enum YamlConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Duration format for YAML (e.g., 30, "30s", "5m").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YamlDuration {
    Seconds(u64),
    String(String),
}

impl YamlDuration {
    pub fn to_std_duration(&self) -> Result<StdDuration, YamlConfigError> {
        match self {
            YamlDuration::Seconds(s) => Ok(StdDuration::from_secs(*s)),
            YamlDuration::String(s) => crate::utils::parse_duration_string(s).map_err(|e| {
                YamlConfigError::Validation(format!("Invalid duration '{}': {}", s, e))
            }),
        }
    }
}

/// Where the converter lives and how to talk to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlTargetConfig {
    /// Full endpoint URL; takes precedence over host/port/path.
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub timeout: Option<YamlDuration>,
    #[serde(default)]
    pub skip_tls_verify: bool,
    pub custom_headers: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlInputConfig {
    pub file: Option<String>,
    pub convert_to: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlLoadConfig {
    pub concurrency: Option<usize>,
    pub total_requests: Option<usize>,
    pub mode: Option<DispatchMode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlOutputConfig {
    pub csv: Option<String>,
    pub summary_json: Option<String>,
    pub histogram_bins: Option<usize>,
}

/// Root of a YAML load test plan. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YamlConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub target: YamlTargetConfig,

    #[serde(default)]
    pub input: YamlInputConfig,

    #[serde(default)]
    pub load: YamlLoadConfig,

    #[serde(default)]
    pub output: YamlOutputConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl YamlConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, YamlConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, YamlConfigError> {
        let config: YamlConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), YamlConfigError> {
        let mut errors = Vec::new();

        if self.version.trim() != "1.0" {
            errors.push(format!(
                "version: unsupported version '{}', expected '1.0'",
                self.version
            ));
        }

        if let Some(ref url) = self.target.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(format!(
                    "target.url: '{}' must start with http:// or https://",
                    url
                ));
            }
        }

        if let Some(ref timeout) = self.target.timeout {
            match timeout.to_std_duration() {
                Ok(d) if d.is_zero() => {
                    errors.push("target.timeout: must be greater than 0".to_string());
                }
                Ok(_) => {}
                Err(e) => errors.push(format!("target.timeout: {}", e)),
            }
        }

        if let Some(ref file) = self.input.file {
            if file.trim().is_empty() {
                errors.push("input.file: must not be empty".to_string());
            }
        }

        if self.load.concurrency == Some(0) {
            errors.push("load.concurrency: must be greater than 0".to_string());
        }
        if self.load.total_requests == Some(0) {
            errors.push("load.totalRequests: must be greater than 0".to_string());
        }
        if self.output.histogram_bins == Some(0) {
            errors.push("output.histogramBins: must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(YamlConfigError::Validation(errors.join("; ")))
        }
    }
}
