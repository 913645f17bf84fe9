//! Logging setup shared by the NeuroGraph binaries.

use serde::{Deserialize, Serialize};

pub mod logging;

pub use logging::{init_logging, LogExt};

/// Default filter directives when neither `RUST_LOG` nor a configured filter
/// is given
pub const DEFAULT_LOG_FILTER: &str = "info,neurograph=debug";

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub log_filter: String,

    /// JSON output instead of the pretty human format
    pub enable_json_logging: bool,
}

impl MonitoringConfig {
    /// Config for `service_name` with the default filter and pretty output
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "neurograph".to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            enable_json_logging: false,
        }
    }
}
