//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for the node's logging output.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name stamped on every log line.
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error), or any
    /// `EnvFilter` directive string.
    pub log_level: String,

    /// Whether to emit JSON formatted logs (default on in containers).
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "oracle-node".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OV_SERVICE_NAME`: Service name (default: oracle-node)
    /// - `OV_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `OV_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OV_SERVICE_NAME").unwrap_or_else(|_| "oracle-node".to_string()),

            log_level: env::var("OV_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("OV_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "oracle-node");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }
}
