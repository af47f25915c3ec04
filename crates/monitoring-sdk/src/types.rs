//! Common types for metric declaration and serving

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MonitoringError;

/// Configuration for the metrics HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Port for metrics HTTP server
    pub port: u16,

    /// Serve the endpoint at all
    pub enabled: bool,

    /// Bind address (default: 127.0.0.1)
    pub bind_address: String,

    /// Scrape path (default: /metrics)
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: 2112,
            enabled: true,
            bind_address: "127.0.0.1".to_string(),
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create new config with port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get bind address with port
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl From<&monitoring_config::ServerConfig> for MetricsConfig {
    fn from(server: &monitoring_config::ServerConfig) -> Self {
        Self {
            port: server.port,
            enabled: server.enabled,
            bind_address: server.bind_address.clone(),
            path: server.path.clone(),
        }
    }
}

/// Monitoring systems a [`crate::Client`] can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Prometheus text exposition, <https://prometheus.io/>
    #[default]
    Prometheus,
}

impl Backend {
    /// Get string label
    pub fn as_label(&self) -> &'static str {
        match self {
            Backend::Prometheus => "prometheus",
        }
    }
}

impl FromStr for Backend {
    type Err = MonitoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prometheus" => Ok(Backend::Prometheus),
            _ => Err(MonitoringError::UnknownBackend(s.to_string())),
        }
    }
}

/// Metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Cumulative value that only increases, or resets to zero on restart
    Counter,
    /// Single value that can arbitrarily go up and down
    Gauge,
}

impl MetricKind {
    /// Get string label
    pub fn as_label(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }

    /// Whether this kind of metric can apply `operation`
    pub fn supports(&self, operation: Operation) -> bool {
        match self {
            MetricKind::Counter => CounterOperation::try_from(operation).is_ok(),
            MetricKind::Gauge => true,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for MetricKind {
    type Err = MonitoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "counter" => Ok(MetricKind::Counter),
            "gauge" => Ok(MetricKind::Gauge),
            _ => Err(MonitoringError::UnknownMetricKind(s.to_string())),
        }
    }
}

/// Operation applied to a metric on every tick.
///
/// Not every operation is available for every [`MetricKind`]; counters only
/// accept [`Operation::Add`] and [`Operation::Increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Replace the value with the produced one
    Set,
    /// Add the produced value
    Add,
    /// Subtract the produced value
    Sub,
    /// Add one, ignoring the produced value
    Increment,
    /// Subtract one, ignoring the produced value
    Decrement,
}

impl Operation {
    /// Get string label
    pub fn as_label(&self) -> &'static str {
        match self {
            Operation::Set => "set",
            Operation::Add => "add",
            Operation::Sub => "sub",
            Operation::Increment => "increment",
            Operation::Decrement => "decrement",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for Operation {
    type Err = MonitoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "set" => Ok(Operation::Set),
            "add" => Ok(Operation::Add),
            "sub" | "subtract" => Ok(Operation::Sub),
            "increment" | "inc" => Ok(Operation::Increment),
            "decrement" | "dec" => Ok(Operation::Decrement),
            _ => Err(MonitoringError::UnknownOperation(s.to_string())),
        }
    }
}

/// The subset of [`Operation`] a counter supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterOperation {
    /// Add the produced value (must be non-negative)
    Add,
    /// Add one
    Increment,
}

impl From<CounterOperation> for Operation {
    fn from(op: CounterOperation) -> Self {
        match op {
            CounterOperation::Add => Operation::Add,
            CounterOperation::Increment => Operation::Increment,
        }
    }
}

impl TryFrom<Operation> for CounterOperation {
    type Error = Operation;

    fn try_from(op: Operation) -> Result<Self, Self::Error> {
        match op {
            Operation::Add => Ok(CounterOperation::Add),
            Operation::Increment => Ok(CounterOperation::Increment),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert_eq!(config.port, 2112);
        assert!(config.enabled);
        assert_eq!(config.path, "/metrics");
        assert_eq!(config.socket_addr(), "127.0.0.1:2112");
    }

    #[test]
    fn test_metrics_config_from_server_section() {
        let server = monitoring_config::ServerConfig {
            port: 9100,
            bind_address: "0.0.0.0".to_string(),
            ..Default::default()
        };
        let config = MetricsConfig::from(&server);
        assert_eq!(config.socket_addr(), "0.0.0.0:9100");
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("Prometheus".parse::<Backend>().unwrap(), Backend::Prometheus);
        assert!(matches!(
            "statsd".parse::<Backend>(),
            Err(MonitoringError::UnknownBackend(name)) if name == "statsd"
        ));
    }

    #[test]
    fn test_operation_labels_round_trip() {
        for op in [
            Operation::Set,
            Operation::Add,
            Operation::Sub,
            Operation::Increment,
            Operation::Decrement,
        ] {
            assert_eq!(op.as_label().parse::<Operation>().unwrap(), op);
        }
        assert_eq!("dec".parse::<Operation>().unwrap(), Operation::Decrement);
        assert!("multiply".parse::<Operation>().is_err());
    }

    #[test]
    fn test_counter_capabilities() {
        assert!(MetricKind::Counter.supports(Operation::Add));
        assert!(MetricKind::Counter.supports(Operation::Increment));
        assert!(!MetricKind::Counter.supports(Operation::Set));
        assert!(!MetricKind::Counter.supports(Operation::Sub));
        assert!(!MetricKind::Counter.supports(Operation::Decrement));
    }

    #[test]
    fn test_gauge_supports_everything() {
        for op in [
            Operation::Set,
            Operation::Add,
            Operation::Sub,
            Operation::Increment,
            Operation::Decrement,
        ] {
            assert!(MetricKind::Gauge.supports(op));
        }
    }
}
