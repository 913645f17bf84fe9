//! Configuration for the NeuroGraph client
//!
//! Values come from serde defaults overridden by `NEUROGRAPH_*` environment
//! variables.

use std::env;
use std::time::Duration;

use neurograph_monitoring::{MonitoringConfig, DEFAULT_LOG_FILTER};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ClientError, ClientResult};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the graph generation service
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Connect timeout for every request
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Total timeout for non-streaming requests
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Log filter directives
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// JSON log output
    #[serde(default)]
    pub json_logs: bool,
}

fn default_service_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            log_filter: default_log_filter(),
            json_logs: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn load() -> ClientResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("NEUROGRAPH_SERVICE_URL") {
            config.service_url = url;
        }

        if let Some(value) = lookup("NEUROGRAPH_CONNECT_TIMEOUT_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => config.connect_timeout_secs = secs,
                Err(_) => warn!("Invalid NEUROGRAPH_CONNECT_TIMEOUT_SECS value: {}", value),
            }
        }

        if let Some(value) = lookup("NEUROGRAPH_REQUEST_TIMEOUT_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => config.request_timeout_secs = secs,
                Err(_) => warn!("Invalid NEUROGRAPH_REQUEST_TIMEOUT_SECS value: {}", value),
            }
        }

        if let Some(filter) = lookup("NEUROGRAPH_LOG_FILTER") {
            config.log_filter = filter;
        }

        if let Some(value) = lookup("NEUROGRAPH_LOG_JSON") {
            match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.json_logs = true,
                "0" | "false" | "no" | "off" => config.json_logs = false,
                _ => warn!("Invalid NEUROGRAPH_LOG_JSON value: {}", value),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the service URL
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.service_url.trim();
        if url.is_empty() {
            return Err(ClientError::Config("service URL is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "service URL must start with http:// or https://: {url}"
            )));
        }
        Ok(())
    }

    /// Absolute URL of an API path such as `/api/generate-graph`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.service_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Logging settings for `neurograph_monitoring::init_logging`
    pub fn monitoring(&self, service_name: &str) -> MonitoringConfig {
        MonitoringConfig {
            service_name: service_name.to_string(),
            log_filter: self.log_filter.clone(),
            enable_json_logging: self.json_logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> ClientResult<ClientConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(load(&[]).unwrap(), ClientConfig::default());
        let config = ClientConfig::default();
        assert_eq!(config.service_url, "http://localhost:8000");
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.request_timeout_secs, 60);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_environment_overrides() {
        let config = load(&[
            ("NEUROGRAPH_SERVICE_URL", "https://graph.example.com/"),
            ("NEUROGRAPH_CONNECT_TIMEOUT_SECS", "3"),
            ("NEUROGRAPH_REQUEST_TIMEOUT_SECS", "120"),
            ("NEUROGRAPH_LOG_FILTER", "warn"),
            ("NEUROGRAPH_LOG_JSON", "true"),
        ])
        .unwrap();

        assert_eq!(config.service_url, "https://graph.example.com/");
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.monitoring("neurograph").log_filter, "warn");
        assert!(config.monitoring("neurograph").enable_json_logging);
        assert_eq!(
            config.endpoint("/api/generate-graph"),
            "https://graph.example.com/api/generate-graph"
        );
    }

    #[test]
    fn test_invalid_numbers_are_ignored() {
        let config = load(&[
            ("NEUROGRAPH_CONNECT_TIMEOUT_SECS", "soon"),
            ("NEUROGRAPH_LOG_JSON", "maybe"),
        ])
        .unwrap();
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_invalid_service_url() {
        assert!(matches!(load(&[("NEUROGRAPH_SERVICE_URL", "")]), Err(ClientError::Config(_))));
        assert!(matches!(
            load(&[("NEUROGRAPH_SERVICE_URL", "localhost:8000")]),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"service_url":"http://svc:9000"}"#).unwrap();
        assert_eq!(config.service_url, "http://svc:9000");
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }
}
