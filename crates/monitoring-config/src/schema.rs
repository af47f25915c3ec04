use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Monitoring backend name
    pub backend: String,

    /// Scrape endpoint settings
    pub server: ServerConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Declared metrics, registered once at start-up
    pub metrics: Vec<MetricSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: default_backend(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            metrics: Vec::new(),
        }
    }
}

/// HTTP scrape endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Serve the scrape endpoint at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the scrape endpoint
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            enabled: true,
            bind_address: default_bind_address(),
            port: default_port(),
            path: default_path(),
        }
    }
}

impl ServerConfig {
    /// `bind_address:port`
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Level: trace, debug, info, warn, error. Unset means `RUST_LOG`,
    /// falling back to `info`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Format: pretty, compact, json
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: None,
            format: default_log_format(),
        }
    }
}

/// Declaration of one metric
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSpec {
    /// Metric name, unique within the configuration
    pub name: String,

    /// Help text
    #[serde(default)]
    pub help: String,

    /// `counter` or `gauge`
    pub kind: String,

    /// `set`, `add`, `sub`, `increment` or `decrement`
    pub operation: String,

    /// Update interval in milliseconds
    pub interval_ms: u64,

    /// Name of a producer registered by the embedding program
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,

    /// Constant value applied on every tick
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl MetricSpec {
    /// Update interval as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_backend() -> String {
    "prometheus".to_string()
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    2112
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend, "prometheus");
        assert_eq!(config.server.socket_addr(), "127.0.0.1:2112");
        assert_eq!(config.server.path, "/metrics");
        assert!(config.metrics.is_empty());
    }

    #[test]
    fn test_metric_interval() {
        let spec = MetricSpec {
            name: "queue_depth".to_string(),
            help: String::new(),
            kind: "gauge".to_string(),
            operation: "set".to_string(),
            interval_ms: 1500,
            producer: None,
            value: None,
        };
        assert_eq!(spec.interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_partial_server_section() {
        let config: Config = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert!(config.server.enabled);
    }
}
