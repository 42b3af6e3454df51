use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::converter::{ConvertError, RemoteConverter};
use crate::utils::parse_headers_with_escapes;

/// Response bodies longer than this are truncated in error descriptions.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Configuration for building the HTTP client.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub skip_tls_verify: bool,
    pub custom_headers: Option<String>,
    pub timeout: Option<Duration>,
}

/// Result of building the client, includes parsed headers for logging.
pub struct ClientBuildResult {
    pub client: reqwest::Client,
    pub parsed_headers: HeaderMap,
}

/// Builds a reqwest HTTP client with the specified configuration.
pub fn build_client(config: &ClientConfig) -> Result<ClientBuildResult, ConfigError> {
    let mut client_builder = reqwest::Client::builder();

    let parsed_headers = configure_custom_headers(config.custom_headers.as_deref())?;
    if !parsed_headers.is_empty() {
        client_builder = client_builder.default_headers(parsed_headers.clone());
        info!(count = parsed_headers.len(), "Configured custom default headers");
    }

    if let Some(timeout) = config.timeout {
        client_builder = client_builder.timeout(timeout);
    }

    if config.skip_tls_verify {
        warn!("Skipping TLS certificate verification");
        client_builder = client_builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    let client = client_builder
        .build()
        .map_err(|e| ConfigError::Client(e.to_string()))?;

    Ok(ClientBuildResult {
        client,
        parsed_headers,
    })
}

fn configure_custom_headers(custom_headers_str: Option<&str>) -> Result<HeaderMap, ConfigError> {
    let mut parsed_headers = HeaderMap::new();

    let headers_str = match custom_headers_str {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(parsed_headers),
    };

    for header_pair_str in parse_headers_with_escapes(headers_str) {
        let trimmed = header_pair_str.trim();
        let Some((name_str, value_str)) = trimmed.split_once(':') else {
            return Err(ConfigError::invalid(
                "CUSTOM_HEADERS",
                format!("'{}' is not in 'Name:Value' format", trimmed),
            ));
        };

        let name_str = name_str.trim();
        if name_str.is_empty() {
            return Err(ConfigError::invalid(
                "CUSTOM_HEADERS",
                format!("header name cannot be empty in '{}'", trimmed),
            ));
        }

        let header_name = HeaderName::from_str(name_str).map_err(|e| {
            ConfigError::invalid(
                "CUSTOM_HEADERS",
                format!("invalid header name '{}': {}", name_str, e),
            )
        })?;
        let header_value = HeaderValue::from_str(value_str.trim()).map_err(|e| {
            ConfigError::invalid(
                "CUSTOM_HEADERS",
                format!("invalid value for '{}': {}", name_str, e),
            )
        })?;

        parsed_headers.insert(header_name, header_value);
    }

    Ok(parsed_headers)
}

/// Converter reached over plain HTTP.
///
/// The payload is POSTed as the request body to `<endpoint>?convert_to=<format>`
/// and a 2xx response body is taken as the converted document. This is only a
/// transport; the service behind the endpoint does the conversion.
#[derive(Debug, Clone)]
pub struct HttpConverter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpConverter {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteConverter for HttpConverter {
    async fn convert(&self, payload: Bytes, target_format: &str) -> Result<Vec<u8>, ConvertError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("convert_to", target_format)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConvertError::Status {
                code: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let output = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(output.to_vec())
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}

fn map_reqwest_error(error: reqwest::Error) -> ConvertError {
    if error.is_timeout() {
        ConvertError::Transport(format!("timed out: {}", error))
    } else {
        ConvertError::Transport(error.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_custom_headers() {
        let headers =
            configure_custom_headers(Some("X-Api-Key:secret,Accept:application/pdf")).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
    }

    #[test]
    fn test_escaped_comma_in_header_value() {
        let headers = configure_custom_headers(Some("Keep-Alive:timeout=5\\,max=200")).unwrap();
        assert_eq!(headers.get("keep-alive").unwrap(), "timeout=5,max=200");
    }

    #[test]
    fn test_invalid_header_format() {
        assert!(configure_custom_headers(Some("NoColonHere")).is_err());
        assert!(configure_custom_headers(Some(":value")).is_err());
    }

    #[test]
    fn test_no_headers() {
        assert!(configure_custom_headers(None).unwrap().is_empty());
        assert!(configure_custom_headers(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }
}
